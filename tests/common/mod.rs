#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use seedview::provision::{FsTransfer, Transfer};
use seedview::ProvisionError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Create a SQLite file holding `rows` in `table`, inserted in the given order.
pub fn seed_db(path: &Path, table: &str, rows: &[(i64, &str)]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE {table} (id INTEGER PRIMARY KEY, nm_nome TEXT NOT NULL)"
    ))
    .unwrap();
    for (id, name) in rows {
        conn.execute(
            &format!("INSERT INTO {table} (id, nm_nome) VALUES (?1, ?2)"),
            params![id, name],
        )
        .unwrap();
    }
}

/// One observed transfer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: &'static str,
    pub source: String,
    /// Whether the target directory existed when the call was made.
    pub dir_existed: bool,
}

/// Transfer double that records every call. Copies really copy; downloads
/// write `payload` (or hang, to exercise timeouts).
#[derive(Clone, Default)]
pub struct RecordingTransfer {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub payload: Vec<u8>,
    pub hang_downloads: bool,
}

impl RecordingTransfer {
    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: &'static str, source: String, to: &Path) {
        let dir_existed = to.parent().map(Path::is_dir).unwrap_or(false);
        self.calls.lock().unwrap().push(Call {
            kind,
            source,
            dir_existed,
        });
    }
}

#[async_trait]
impl Transfer for RecordingTransfer {
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, ProvisionError> {
        self.record("copy", from.display().to_string(), to);
        tokio::fs::copy(from, to)
            .await
            .map_err(|source| ProvisionError::AssetCopy {
                path: to.to_path_buf(),
                source,
            })
    }

    async fn write_embedded(
        &self,
        bytes: &'static [u8],
        to: &Path,
    ) -> Result<u64, ProvisionError> {
        self.record("embedded", String::new(), to);
        tokio::fs::write(to, bytes)
            .await
            .map_err(|source| ProvisionError::AssetWrite {
                path: to.to_path_buf(),
                source,
            })?;
        Ok(bytes.len() as u64)
    }

    async fn download(&self, url: &Url, to: &Path) -> Result<u64, ProvisionError> {
        self.record("download", url.to_string(), to);
        if self.hang_downloads {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::fs::write(to, &self.payload)
            .await
            .map_err(|source| ProvisionError::AssetWrite {
                path: to.to_path_buf(),
                source,
            })?;
        Ok(self.payload.len() as u64)
    }
}

/// A seed database written to `dir/seed.db` with the two canonical rows.
pub fn alpha_beta_seed(dir: &Path) -> PathBuf {
    let path = dir.join("seed.db");
    seed_db(&path, "classes", &[(1, "Alpha"), (2, "Beta")]);
    path
}

/// Production transfer with proxies disabled, so requests reach the local server.
pub fn local_http_transfer() -> FsTransfer {
    FsTransfer::new(reqwest::Client::builder().no_proxy().build().unwrap())
}

/// Serve `body` at `/data.db` on an ephemeral localhost port; every other path
/// answers 404. Returns the base URL.
pub async fn serve_asset(body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/");
                let (status, payload) = if path == "/data.db" {
                    ("200 OK", body)
                } else {
                    ("404 Not Found", Vec::new())
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    payload.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.write_all(&payload).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}
