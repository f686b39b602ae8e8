use std::sync::Arc;

use mosaic::application::registry::{self, RegistryError, TemplateRegistry};
use mosaic::templates::{STANDARD_PAGE, register_stock};

#[test]
fn registry_installs_once_per_process() {
    assert!(registry::installed().is_none());

    let mut stock = TemplateRegistry::new();
    let added = register_stock(&mut stock).expect("stock templates");
    assert_eq!(added, 5);

    let shared = registry::install(stock).expect("first install");
    let installed = registry::installed().expect("installed registry");
    assert!(Arc::ptr_eq(&shared, &installed));
    assert!(installed.page(STANDARD_PAGE).is_some());

    let err = registry::install(TemplateRegistry::new()).expect_err("second install");
    assert!(matches!(err, RegistryError::AlreadyInstalled));
}
