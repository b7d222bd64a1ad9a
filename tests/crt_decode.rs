use acm_expiry_checker::{InventoryProvider, PemDirInventory, X509Crt};

// notAfter=Oct 15 18:45:04 2036 GMT
const FIXTURE_NOT_AFTER: i64 = 2107709104;

#[test]
fn crt_decode_test() {
    let crt = X509Crt::from_pem_file("tests/fixtures/www.example.com.pem").unwrap();
    let alt_names = crt.alt_names().collect::<Vec<_>>();

    assert_eq!(crt.domain_name(), Some("www.example.com"));
    assert_eq!(alt_names.as_slice(), ["www.example.com", "alt1.example.com"]);
    assert_eq!(crt.not_after().timestamp(), FIXTURE_NOT_AFTER);
}

#[test]
fn crt_without_common_name() {
    let crt = X509Crt::from_pem_file("tests/fixtures/san-only.crt").unwrap();

    assert_eq!(crt.domain_name(), Some("san.example.org"));
}

#[test]
fn crt_decode_not_pem() {
    assert!(X509Crt::from_pem_file("tests/fixtures/notes.txt").is_err());
    assert!(X509Crt::from_pem_file("tests/fixtures/missing.pem").is_err());
}

#[tokio::test]
async fn pem_dir_inventory() {
    let inventory = PemDirInventory::new("tests/fixtures");
    let certificates = inventory.list_certificates().await.unwrap();

    // notes.txt is not listed, files are in path order
    let domains = certificates
        .iter()
        .map(|c| c.domain_name())
        .collect::<Vec<_>>();
    assert_eq!(domains.as_slice(), ["san.example.org", "www.example.com"]);

    assert!(certificates[1].identifier().ends_with("www.example.com.pem"));
    assert_eq!(certificates[1].not_after().timestamp(), FIXTURE_NOT_AFTER);
}

#[tokio::test]
async fn pem_dir_inventory_missing_dir() {
    let inventory = PemDirInventory::new("tests/no-such-dir");
    assert!(inventory.list_certificates().await.is_err());
}
