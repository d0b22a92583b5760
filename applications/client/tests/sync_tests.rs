/// End-to-end sync tests: the real client engine against the real server.
use chorus_client::{ClientConfig, ClientError, SyncEngine};
use chorus_protocol::{message, Connection};
use chorus_server::config::{LimitSettings, ServerConfig, ServerSettings, StorageSettings};
use chorus_server::server::SyncServer;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;

async fn start_server(data_dir: &Path) -> SocketAddr {
    let config = ServerConfig {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        storage: StorageSettings {
            data_dir: data_dir.to_path_buf(),
        },
        limits: LimitSettings {
            max_sessions: 8,
            io_timeout_secs: 5,
        },
    };
    let server = SyncServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

fn engine(addr: SocketAddr, username: &str, local_dir: &Path) -> SyncEngine {
    let mut config = ClientConfig::new(addr.ip().to_string(), addr.port(), username);
    config.local_dir = local_dir.to_path_buf();
    config.io_timeout = Duration::from_secs(5);
    SyncEngine::new(config)
}

#[tokio::test]
async fn fresh_user_syncs_an_empty_library() {
    let server_dir = TempDir::new().unwrap();
    let client_dir = TempDir::new().unwrap();
    let addr = start_server(server_dir.path()).await;

    let report = engine(addr, "ana", client_dir.path())
        .sync(|_library, _history| {})
        .await
        .unwrap();

    assert_eq!(report.downloaded_files, 0);
    assert_eq!(report.uploaded_files, 0);
    assert!(report.library.songs.is_empty());

    // The upload became the canonical snapshot on the server
    assert!(server_dir
        .path()
        .join("ana")
        .join("library.json")
        .exists());
}

#[tokio::test]
async fn edits_survive_to_the_next_sync() {
    let server_dir = TempDir::new().unwrap();
    let client_dir = TempDir::new().unwrap();
    let addr = start_server(server_dir.path()).await;

    // Sync 1: add a song and a playlist
    engine(addr, "ana", client_dir.path())
        .sync(|library, history| {
            let id = library
                .add_song("Clocks", "Coldplay", 307, "Alternative", "clocks.mp3")
                .unwrap();
            history.register(library);

            library.create_playlist("Morning");
            library.playlist_mut("Morning").unwrap().add_song(id);
            history.register(library);
        })
        .await
        .unwrap();

    // Sync 2 from a clean local directory downloads the edited state
    let other_dir = TempDir::new().unwrap();
    let report = engine(addr, "ana", other_dir.path())
        .sync(|library, _history| {
            assert_eq!(library.songs.len(), 1);
            assert_eq!(library.songs[0].title, "Clocks");
            assert_eq!(library.playlist("morning").unwrap().song_ids, vec![1]);
        })
        .await
        .unwrap();
    assert_eq!(report.library.songs.len(), 1);
}

#[tokio::test]
async fn undone_edits_are_not_uploaded() {
    let server_dir = TempDir::new().unwrap();
    let client_dir = TempDir::new().unwrap();
    let addr = start_server(server_dir.path()).await;

    engine(addr, "ana", client_dir.path())
        .sync(|library, history| {
            library.add_song("One", "X", 60, "Rock", "one.mp3");
            history.register(library);
            library.add_song("Two", "X", 60, "Rock", "two.mp3");
            history.register(library);

            // Second thoughts: revert to the one-song state
            *library = history.undo().unwrap();
            assert!(history.can_redo());
        })
        .await
        .unwrap();

    let fresh_dir = TempDir::new().unwrap();
    let report = engine(addr, "ana", fresh_dir.path())
        .sync(|_, _| {})
        .await
        .unwrap();
    assert_eq!(report.library.songs.len(), 1);
    assert_eq!(report.library.songs[0].title, "One");
}

#[tokio::test]
async fn local_audio_files_are_uploaded_and_redownloaded() {
    let server_dir = TempDir::new().unwrap();
    let client_dir = TempDir::new().unwrap();
    let addr = start_server(server_dir.path()).await;

    // Place an audio file where the engine will look for uploads
    let user_dir = client_dir.path().join("ana");
    std::fs::create_dir_all(&user_dir).unwrap();
    let data = b"not really mpeg frames".to_vec();
    std::fs::write(user_dir.join("clocks.mp3"), &data).unwrap();

    let report = engine(addr, "ana", client_dir.path())
        .sync(|library, history| {
            library.add_song("Clocks", "Coldplay", 307, "Alternative", "clocks.mp3");
            history.register(library);
        })
        .await
        .unwrap();
    assert_eq!(report.uploaded_files, 1);
    assert_eq!(
        std::fs::read(server_dir.path().join("ana").join("clocks.mp3")).unwrap(),
        data
    );

    // A second machine gets the file on its first sync
    let other_dir = TempDir::new().unwrap();
    let report = engine(addr, "ana", other_dir.path())
        .sync(|_, _| {})
        .await
        .unwrap();
    assert_eq!(report.downloaded_files, 1);
    assert_eq!(
        std::fs::read(other_dir.path().join("ana").join("clocks.mp3")).unwrap(),
        data
    );
    // Unchanged files are re-uploaded every sync
    assert_eq!(report.uploaded_files, 1);
}

#[tokio::test]
async fn concurrent_login_is_rejected_cleanly() {
    let server_dir = TempDir::new().unwrap();
    let client_dir = TempDir::new().unwrap();
    let addr = start_server(server_dir.path()).await;

    // Hold a raw session open for bob
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut held = Connection::new(stream, Duration::from_secs(5));
    held.send_header(message::LOGIN, "bob").await.unwrap();
    held.expect_line(message::OK).await.unwrap();

    // The engine's sync attempt ends cleanly with a rejection
    let err = engine(addr, "bob", client_dir.path())
        .sync(|_, _| panic!("edit phase must never be reached"))
        .await
        .unwrap_err();
    assert!(err.is_rejection());
    assert!(matches!(err, ClientError::SessionRejected(name) if name == "bob"));

    // No local state was created for the rejected attempt's download
    assert!(!client_dir.path().join("bob").exists());
}

#[tokio::test]
async fn two_users_sync_independently() {
    let server_dir = TempDir::new().unwrap();
    let addr = start_server(server_dir.path()).await;

    let ana_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();

    let ana_engine = engine(addr, "ana", ana_dir.path());
    let ana = ana_engine.sync(|library, history| {
        library.add_song("Hers", "A", 10, "g", "hers.mp3");
        history.register(library);
    });
    let bob_engine = engine(addr, "bob", bob_dir.path());
    let bob = bob_engine.sync(|library, history| {
        library.add_song("His", "B", 10, "g", "his.mp3");
        history.register(library);
    });

    let (ana, bob) = tokio::join!(ana, bob);
    assert_eq!(ana.unwrap().library.songs[0].title, "Hers");
    assert_eq!(bob.unwrap().library.songs[0].title, "His");
}
