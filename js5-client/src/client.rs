//! The pipelined content-protocol client.
//!
//! One TCP connection carries every request. Responses arrive as
//! interleaved fixed-size blocks, each prefixed with the category and
//! file id it belongs to, so a single background demultiplexer routes
//! bytes into per-request slots and wakes each caller when its
//! container is complete. Requests can therefore be issued
//! concurrently from any number of tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use rt5_cache::{CacheSource, REFERENCE_CATEGORY};
use rt5_container::CONTAINER_HEADER_LENGTH;
use rt5_reference::ReferenceTable;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex as AsyncMutex, OnceCell, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::Js5Config;
use crate::{Error, Result, key, wire};

/// Bytes of routing tag preceding every response block.
const TAG_LENGTH: usize = 5;

type RequestKey = (u8, u32);

/// Accumulation state for one in-flight request.
#[derive(Debug)]
struct PendingSlot {
    buffer: Vec<u8>,
    /// Full container length, known after the first response block.
    total_length: Option<usize>,
    sender: Option<oneshot::Sender<Result<Vec<u8>>>>,
}

/// Connection state shared with the demultiplexer task.
#[derive(Debug)]
struct Shared {
    reader: AsyncMutex<OwnedReadHalf>,
    writer: AsyncMutex<OwnedWriteHalf>,
    pending: DashMap<RequestKey, Arc<Mutex<PendingSlot>>>,
    demux_running: AtomicBool,
    broken: AtomicBool,
    block_length: usize,
}

/// Client for the content server's TCP protocol.
///
/// Created by [`Js5Client::connect`]; dropping it closes the
/// connection. A client whose stream has desynchronised or failed
/// refuses further requests and must be rebuilt with a fresh
/// `connect`.
#[derive(Debug)]
pub struct Js5Client {
    config: Js5Config,
    major_version: u32,
    http: reqwest::Client,
    tables: DashMap<u8, Arc<OnceCell<Arc<ReferenceTable>>>>,
    shared: Arc<Shared>,
}

impl Js5Client {
    /// Connects and completes the version handshake.
    ///
    /// The handshake key is scraped from the configured key page. When
    /// the server reports the offered major version outdated the
    /// connection is rebuilt with the next version, up to
    /// `max_handshake_attempts`.
    pub async fn connect(config: Js5Config) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let key = key::fetch_key(&http, &config.key_page).await?;

        let address = format!("{}:{}", config.content_host, config.content_port);
        let block_length = config.block_length;
        let mut major_version = config.major_version;

        for attempt in 0..config.max_handshake_attempts {
            debug!(major_version, attempt, "attempting handshake");
            let mut stream = TcpStream::connect(&address).await?;
            let packet = wire::handshake_packet(
                major_version,
                config.minor_version,
                &key,
                config.language,
            )?;
            stream.write_all(&packet).await?;

            match stream.read_u8().await? {
                wire::RESPONSE_SUCCESS => {
                    let mut requirements = [0u8; wire::LOADING_REQUIREMENTS_LENGTH];
                    stream.read_exact(&mut requirements).await?;
                    stream.write_all(&wire::connection_info_packets()?).await?;
                    info!(major_version, "connected to content server");

                    let (read_half, write_half) = stream.into_split();
                    return Ok(Self {
                        config,
                        major_version,
                        http,
                        tables: DashMap::new(),
                        shared: Arc::new(Shared {
                            reader: AsyncMutex::new(read_half),
                            writer: AsyncMutex::new(write_half),
                            pending: DashMap::new(),
                            demux_running: AtomicBool::new(false),
                            broken: AtomicBool::new(false),
                            block_length,
                        }),
                    });
                }
                wire::RESPONSE_OUTDATED => {
                    debug!(major_version, "server reports version outdated");
                    major_version += 1;
                }
                code => return Err(Error::Handshake { code }),
            }
        }

        // With a zero attempt bound no version was ever offered, so the
        // report clamps to the configured starting version.
        Err(Error::HandshakeAttemptsExhausted {
            attempts: config.max_handshake_attempts,
            last_version: major_version.saturating_sub(1).max(config.major_version),
        })
    }

    /// The major protocol version the server accepted.
    pub fn major_version(&self) -> u32 {
        self.major_version
    }

    /// Whether the connection is still usable.
    pub fn is_connected(&self) -> bool {
        !self.shared.broken.load(Ordering::Acquire)
    }

    /// Requests one raw container.
    ///
    /// Categories listed in `http_categories` are fetched over the HTTP
    /// side-channel; everything else goes over the socket. The returned
    /// bytes are the container as stored, not yet decompressed.
    #[instrument(skip(self))]
    pub async fn request_file(&self, category: u8, file_id: u32) -> Result<Vec<u8>> {
        if category != REFERENCE_CATEGORY && self.config.http_categories.contains(&category) {
            return self.request_file_http(category, file_id).await;
        }
        self.request_file_socket(category, file_id).await
    }

    /// Requests one raw container over the socket.
    async fn request_file_socket(&self, category: u8, file_id: u32) -> Result<Vec<u8>> {
        if self.shared.broken.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }

        let request_key = (category, file_id);
        let (sender, receiver) = oneshot::channel();
        let slot = Arc::new(Mutex::new(PendingSlot {
            buffer: Vec::new(),
            total_length: None,
            sender: Some(sender),
        }));
        match self.shared.pending.entry(request_key) {
            Entry::Occupied(_) => {
                return Err(Error::RequestAlreadyPending { category, file_id });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
        }

        let packet = wire::request_packet(category == REFERENCE_CATEGORY, category, file_id)?;
        {
            let mut writer = self.shared.writer.lock().await;
            if let Err(error) = writer.write_all(&packet).await {
                self.shared.pending.remove(&request_key);
                return Err(error.into());
            }
        }
        self.ensure_demultiplexer();

        let outcome = match self.config.request_timeout {
            Some(limit) => match timeout(limit, receiver).await {
                Ok(received) => received,
                // The slot stays registered so the demultiplexer can
                // drain the remaining blocks and keep the stream in
                // sync; the send into the dropped channel is a no-op.
                Err(_) => {
                    warn!(category, file_id, "request timed out");
                    return Err(Error::RequestTimeout { category, file_id });
                }
            },
            None => receiver.await,
        };
        outcome.map_err(|_| Error::ConnectionClosed)?
    }

    /// Fetches and memoizes the reference table for `category`.
    ///
    /// Concurrent callers share a single socket fetch per category: the
    /// first claims the category's cell and the rest await its result,
    /// so no internal duplicate of the table request ever reaches the
    /// pending map. A failed fetch leaves the cell empty for retry.
    pub async fn reference_table(&self, category: u8) -> Result<Arc<ReferenceTable>> {
        let cell = Arc::clone(
            self.tables
                .entry(category)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );
        let table = cell
            .get_or_try_init(|| async {
                let raw = self
                    .request_file_socket(REFERENCE_CATEGORY, u32::from(category))
                    .await?;
                let data = rt5_container::decompress(&raw)?;
                Ok::<_, Error>(Arc::new(ReferenceTable::decode(&data)?))
            })
            .await?;
        Ok(Arc::clone(table))
    }

    /// Fetches a file over the HTTP side-channel.
    ///
    /// The URL carries the file's CRC and version from its reference
    /// entry, so the table is fetched (over the socket) first.
    async fn request_file_http(&self, category: u8, file_id: u32) -> Result<Vec<u8>> {
        let table = self.reference_table(category).await?;
        let entry = table
            .entry(file_id)
            .ok_or(Error::FileNotFound { category, file_id })?;

        let base = match &self.config.http_interface {
            Some(base) => base.clone(),
            None => format!("http://{}", self.config.content_host),
        };
        let url = format!(
            "{base}/ms?m=0&a={category}&g={file_id}&c={crc}&v={version}",
            crc = entry.crc,
            version = entry.version,
        );
        debug!(url, "fetching file over http side-channel");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Starts the demultiplexer task unless one is already running.
    fn ensure_demultiplexer(&self) {
        if self
            .shared
            .demux_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            trace!("spawning demultiplexer");
            let shared = Arc::clone(&self.shared);
            tokio::spawn(shared.run_demultiplexer());
        }
    }
}

impl Shared {
    /// Routes response blocks into pending slots until none remain.
    async fn run_demultiplexer(self: Arc<Self>) {
        trace!("demultiplexer started");
        loop {
            if self.pending.is_empty() {
                self.demux_running.store(false, Ordering::Release);
                if self.pending.is_empty() {
                    break;
                }
                // A request slipped in while we were shutting down.
                // Reclaim the task unless its sender already spawned a
                // replacement.
                if self
                    .demux_running
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    break;
                }
                continue;
            }

            let mut reader = self.reader.lock().await;
            if let Err(error) = self.read_round(&mut *reader).await {
                drop(reader);
                warn!(%error, "demultiplexer failed");
                self.fail_all();
                self.demux_running.store(false, Ordering::Release);
                break;
            }
        }
        trace!("demultiplexer stopped");
    }

    /// Reads one response block and appends it to its slot.
    async fn read_round<R>(&self, reader: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let category = reader.read_u8().await?;
        // The high bit echoes the request priority flag.
        let file_id = (reader.read_i32().await? as u32) & 0x7fff_ffff;
        let request_key = (category, file_id);

        let slot = match self.pending.get(&request_key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Err(Error::ProtocolDesync { category, file_id }),
        };

        let mut consumed = TAG_LENGTH;
        let is_first = slot.lock().total_length.is_none();
        if is_first {
            // The container's own header rides in the first block right
            // after the tag. It belongs in the output, so it is folded
            // into the buffer rather than consumed.
            let mut header = [0u8; CONTAINER_HEADER_LENGTH];
            reader.read_exact(&mut header).await?;
            consumed += header.len();

            let compression = header[0];
            let length =
                u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
            let total = CONTAINER_HEADER_LENGTH + usize::from(compression != 0) * 4 + length;
            trace!(category, file_id, total, "response opened");

            let mut guard = slot.lock();
            guard.buffer.extend_from_slice(&header);
            guard.total_length = Some(total);
        }

        let to_read = {
            let guard = slot.lock();
            let total = guard.total_length.unwrap_or(guard.buffer.len());
            total
                .saturating_sub(guard.buffer.len())
                .min(self.block_length.saturating_sub(consumed))
        };
        if to_read > 0 {
            let mut block = vec![0u8; to_read];
            reader.read_exact(&mut block).await?;
            slot.lock().buffer.append(&mut block);
        }

        let complete = {
            let guard = slot.lock();
            guard.total_length == Some(guard.buffer.len())
        };
        if complete && let Some((_, slot)) = self.pending.remove(&request_key) {
            let (buffer, sender) = {
                let mut guard = slot.lock();
                (std::mem::take(&mut guard.buffer), guard.sender.take())
            };
            trace!(category, file_id, length = buffer.len(), "response complete");
            if let Some(sender) = sender {
                let _ = sender.send(Ok(buffer));
            }
        }
        Ok(())
    }

    /// Marks the connection broken and wakes every waiter with an error.
    fn fail_all(&self) {
        self.broken.store(true, Ordering::Release);
        let keys: Vec<RequestKey> = self.pending.iter().map(|entry| *entry.key()).collect();
        for request_key in keys {
            if let Some((_, slot)) = self.pending.remove(&request_key)
                && let Some(sender) = slot.lock().sender.take()
            {
                let _ = sender.send(Err(Error::ConnectionClosed));
            }
        }
    }
}

#[async_trait]
impl CacheSource for Js5Client {
    async fn fetch_raw_file(&self, category: u8, file_id: u32) -> rt5_cache::Result<Vec<u8>> {
        self.request_file(category, file_id).await.map_err(Into::into)
    }

    async fn reference_table(&self, category: u8) -> rt5_cache::Result<Arc<ReferenceTable>> {
        Js5Client::reference_table(self, category)
            .await
            .map_err(Into::into)
    }
}
