//! Shared setup for integration tests: a mock EDSM server, a client pointed
//! at it, and a registry store in a temporary directory.

use edtrack_lib::{EdsmClient, RegistryStore};
use mockito::ServerGuard;
use tempfile::TempDir;

pub struct TestContext {
    pub server: ServerGuard,
    pub client: EdsmClient,
    pub store: RegistryStore,
    _data_dir: TempDir,
}

pub fn setup() -> TestContext {
    let server = mockito::Server::new();
    let client = EdsmClient::with_base_url(server.url()).expect("build client");
    let data_dir = TempDir::new().expect("create temp dir");
    let store = RegistryStore::open(data_dir.path()).expect("open registry");
    TestContext {
        server,
        client,
        store,
        _data_dir: data_dir,
    }
}
