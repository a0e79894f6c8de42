use crate::command::{CommandFrame, Opcode};
use crate::config::DriverConfig;
use crate::configuration::{Configuration, DeviceClock};
use crate::constants::{
    CONFIGURATION_LENGTH, DATAFLASH_LENGTH, LOGO_LENGTH, LOGO_OFFSET, MONITORING_DATA_LENGTH, SCREENSHOT_LENGTH,
};
use crate::demux::{Demultiplexer, RequestTicket, ResponseReceiver};
use crate::error::FoxError;
use crate::monitoring::MonitoringData;
use crate::response::{ExpectedKind, Response};
use crate::transport::{Transport, TransportError, TransportHandle, UsbHidTransport};
use bytes::Bytes;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Lifecycle notifications, delivered to every [`ArcticFox::subscribe`] receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Connected,
    Closed,
    /// A transport error; fatal ones are followed by `Closed` and a reconnect
    Error(TransportError),
}

/// Fatal transport error tagged with the link generation it came from.
type Failure = (u64, TransportError);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Link<H> {
    handle: Arc<H>,
    reader: JoinHandle<()>,
    generation: u64,
}

struct Shared<T: Transport> {
    transport: T,
    config: DriverConfig,
    state: watch::Sender<ConnectionState>,
    events: broadcast::Sender<LinkEvent>,
    link: Mutex<Option<Link<T::Handle>>>,
    generation: AtomicU64,
    demux: Mutex<Demultiplexer>,
    failures: Mutex<Option<mpsc::UnboundedSender<Failure>>>,
}

impl<T: Transport> Shared<T> {
    fn emit(&self, event: LinkEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn current_link(&self) -> Result<(Arc<T::Handle>, u64), FoxError> {
        lock(&self.link)
            .as_ref()
            .map(|link| (Arc::clone(&link.handle), link.generation))
            .ok_or(FoxError::NotConnected)
    }

    async fn open_link(self: &Arc<Self>) -> Result<(), FoxError> {
        self.state.send_replace(ConnectionState::Connecting);
        match self.transport.open(self.config.vendor_id, self.config.product_id).await {
            Ok(handle) => {
                let handle = Arc::new(handle);
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                let reader = tokio::spawn(read_loop(Arc::clone(self), Arc::clone(&handle), generation));
                *lock(&self.link) = Some(Link {
                    handle,
                    reader,
                    generation,
                });
                self.state.send_replace(ConnectionState::Connected);
                info!(generation, "Device connected");
                self.emit(LinkEvent::Connected);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "Failed to open device");
                self.state.send_replace(ConnectionState::Disconnected);
                self.emit(LinkEvent::Error(err.clone()));
                Err(FoxError::TransportOpen(err))
            }
        }
    }

    async fn close_link(&self) {
        let link = lock(&self.link).take();
        if let Some(link) = &link {
            link.reader.abort();
            link.handle.close().await;
        }
        lock(&self.demux).abandon(FoxError::Disconnected);
        self.state.send_replace(ConnectionState::Disconnected);
        if link.is_some() {
            info!("Device disconnected");
            self.emit(LinkEvent::Closed);
        }
    }

    /// Retry with a fixed delay until the device opens.
    async fn reconnect(self: &Arc<Self>) {
        loop {
            let delay = self.config.reconnect_delay();
            info!(delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
            tokio::time::sleep(delay).await;
            if self.open_link().await.is_ok() {
                return;
            }
        }
    }

    fn report_failure(&self, generation: u64, err: TransportError) {
        warn!(%err, fatal = err.is_fatal(), "Transport error");
        self.emit(LinkEvent::Error(err.clone()));
        if err.is_fatal() {
            if let Some(failures) = lock(&self.failures).as_ref() {
                let _ = failures.send((generation, err));
            }
        }
    }
}

async fn read_loop<T: Transport>(shared: Arc<Shared<T>>, handle: Arc<T::Handle>, generation: u64) {
    loop {
        match handle.read().await {
            Ok(chunk) => {
                debug!(len = chunk.len(), bytes = %hex::encode(&chunk), "Received chunk");
                lock(&shared.demux).on_chunk(&chunk, Instant::now());
            }
            Err(err) => {
                let fatal = err.is_fatal();
                shared.report_failure(generation, err);
                if fatal {
                    return;
                }
            }
        }
    }
}

async fn supervise<T: Transport>(
    shared: Arc<Shared<T>>,
    mut failures: mpsc::UnboundedReceiver<Failure>,
    connected: bool,
) {
    if !connected {
        shared.reconnect().await;
    }
    while let Some((generation, err)) = failures.recv().await {
        if generation != shared.generation.load(Ordering::Acquire) {
            debug!(generation, %err, "Ignoring failure from a previous link");
            continue;
        }
        shared.close_link().await;
        shared.reconnect().await;
    }
}

/// Withdraws a request from the demultiplexer when its caller stops waiting,
/// including when the request future is dropped mid-flight.
struct PendingGuard<'a> {
    demux: &'a Mutex<Demultiplexer>,
    ticket: RequestTicket,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        // no-op once the request completed or timed out
        lock(self.demux).cancel(self.ticket);
    }
}

/// Driver for an ArcticFox device.
///
/// Requests are serialized: a call made while another request is in flight
/// waits for it to finish, in call order.
pub struct ArcticFox<T: Transport = UsbHidTransport> {
    shared: Arc<Shared<T>>,
    requests: tokio::sync::Mutex<()>,
    supervisor: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ArcticFox<UsbHidTransport> {
    /// Driver over USB using `config`.
    pub fn usb(config: DriverConfig) -> Self {
        let transport = UsbHidTransport::new(&config);
        Self::new(transport, config)
    }
}

impl<T: Transport> ArcticFox<T> {
    pub fn new(transport: T, config: DriverConfig) -> Self {
        let demux = Demultiplexer::new(config.revision.gate(), config.request_timeout());
        let (events, _) = broadcast::channel(32);
        Self {
            shared: Arc::new(Shared {
                transport,
                config,
                state: watch::channel(ConnectionState::Disconnected).0,
                events,
                link: Mutex::new(None),
                generation: AtomicU64::new(0),
                demux: Mutex::new(demux),
                failures: Mutex::new(None),
            }),
            requests: tokio::sync::Mutex::new(()),
            supervisor: tokio::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Watch connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.shared.events.subscribe()
    }

    /// Open the device and keep it open.
    ///
    /// The first attempt runs inline and its error is returned, but either
    /// way a background task keeps reconnecting after open failures and
    /// fatal transport errors until [`disconnect`](Self::disconnect).
    ///
    /// While that task is running, another call only reports whether the
    /// device is connected right now: `NotConnected` during a reconnect.
    pub async fn connect(&self) -> Result<(), FoxError> {
        let mut supervisor = self.supervisor.lock().await;
        if supervisor.as_ref().is_some_and(|task| !task.is_finished()) {
            return match self.state() {
                ConnectionState::Connected => Ok(()),
                _ => Err(FoxError::NotConnected),
            };
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.shared.failures) = Some(tx);

        let result = self.shared.open_link().await;
        *supervisor = Some(tokio::spawn(supervise(
            Arc::clone(&self.shared),
            rx,
            result.is_ok(),
        )));
        result
    }

    /// Close the device and stop reconnecting. Idempotent.
    pub async fn disconnect(&self) {
        let mut supervisor = self.supervisor.lock().await;
        if let Some(task) = supervisor.take() {
            task.abort();
        }
        *lock(&self.shared.failures) = None;
        self.shared.close_link().await;
    }

    pub async fn read_monitoring_data(&self) -> Result<MonitoringData, FoxError> {
        let frame = CommandFrame::new(Opcode::ReadMonitoringData, 0, MONITORING_DATA_LENGTH as u32);
        self.request(ExpectedKind::Monitoring, frame).await?.into_monitoring()
    }

    /// Read and decode the configuration record, rejecting incompatible
    /// firmware through the active revision's version gate.
    pub async fn read_configuration(&self) -> Result<Configuration, FoxError> {
        let frame = CommandFrame::new(Opcode::ReadConfiguration, 0, CONFIGURATION_LENGTH as u32);
        self.request(ExpectedKind::Configuration, frame)
            .await?
            .into_configuration()
    }

    /// Raw 1-bit-per-pixel screen image.
    pub async fn screenshot(&self) -> Result<Bytes, FoxError> {
        let frame = CommandFrame::new(Opcode::Screenshot, 0, SCREENSHOT_LENGTH as u32);
        self.request(ExpectedKind::ScreenCapture, frame)
            .await?
            .into_screen_capture()
    }

    pub async fn read_dataflash(&self) -> Result<Bytes, FoxError> {
        let frame = CommandFrame::new(Opcode::ReadDataflash, 0, DATAFLASH_LENGTH as u32);
        self.request(ExpectedKind::Dataflash, frame).await?.into_dataflash()
    }

    pub async fn write_configuration(&self, config: &Configuration) -> Result<(), FoxError> {
        if !self.shared.config.revision.supports_configuration_write() {
            return Err(FoxError::Unsupported(format!(
                "configuration writes with the {:?} revision",
                self.shared.config.revision
            )));
        }
        let payload = config.encode()?;
        let frame = CommandFrame::new(Opcode::WriteConfiguration, 0, CONFIGURATION_LENGTH as u32);
        self.execute(frame, Some(&payload)).await
    }

    pub async fn restart(&self) -> Result<(), FoxError> {
        self.execute(CommandFrame::new(Opcode::Restart, 0, 0), None).await
    }

    /// Fire the coil for `seconds`.
    pub async fn make_puff(&self, seconds: u32) -> Result<(), FoxError> {
        self.execute(CommandFrame::new(Opcode::Puff, seconds, 0), None).await
    }

    pub async fn set_date_time(&self, when: NaiveDateTime) -> Result<(), FoxError> {
        let clock = DeviceClock::try_from(when)?;
        let frame = CommandFrame::new(Opcode::SetDateTime, 0, 0);
        self.execute(frame, Some(&clock.to_bytes())).await
    }

    pub async fn reset_dataflash(&self) -> Result<(), FoxError> {
        self.execute(CommandFrame::new(Opcode::ResetDataflash, 0, 0), None).await
    }

    /// Replace the boot logo with a 1024-byte image.
    pub async fn write_logo(&self, image: &[u8]) -> Result<(), FoxError> {
        if image.len() != LOGO_LENGTH {
            return Err(FoxError::InvalidArgument(format!(
                "logo must be {LOGO_LENGTH} bytes, got {}",
                image.len()
            )));
        }
        let frame = CommandFrame::new(Opcode::WriteData, LOGO_OFFSET, LOGO_LENGTH as u32);
        self.execute(frame, Some(image)).await
    }

    async fn request(&self, kind: ExpectedKind, frame: CommandFrame) -> Result<Response, FoxError> {
        let _queue = self.requests.lock().await;
        let (handle, generation) = self.shared.current_link()?;

        // registered before writing so an immediate answer is not dropped
        let (ticket, rx) = lock(&self.shared.demux).issue(kind, Instant::now())?;
        let _pending = PendingGuard {
            demux: &self.shared.demux,
            ticket,
        };
        self.send(&handle, generation, &frame.to_bytes()).await?;
        self.await_response(ticket, rx).await
    }

    async fn await_response(&self, ticket: RequestTicket, mut rx: ResponseReceiver) -> Result<Response, FoxError> {
        loop {
            let deadline = lock(&self.shared.demux).deadline(ticket);
            let Some(deadline) = deadline else {
                break;
            };
            match tokio::time::timeout_at(deadline, &mut rx).await {
                Ok(result) => return result.unwrap_or(Err(FoxError::Disconnected)),
                // a chunk may have pushed the deadline out, so re-check
                Err(_) => {
                    lock(&self.shared.demux).expire(ticket, Instant::now());
                }
            }
        }
        rx.await.unwrap_or(Err(FoxError::Disconnected))
    }

    async fn execute(&self, frame: CommandFrame, payload: Option<&[u8]>) -> Result<(), FoxError> {
        let _queue = self.requests.lock().await;
        let (handle, generation) = self.shared.current_link()?;
        self.send(&handle, generation, &frame.to_bytes()).await?;
        if let Some(payload) = payload {
            self.send(&handle, generation, payload).await?;
        }
        Ok(())
    }

    async fn send(&self, handle: &T::Handle, generation: u64, data: &[u8]) -> Result<(), FoxError> {
        debug!(len = data.len(), bytes = %hex::encode(data), "Sending");
        handle.write(data).await.map_err(|err| {
            self.shared.report_failure(generation, err.clone());
            FoxError::TransportWrite(err)
        })
    }
}

impl<T: Transport> Drop for ArcticFox<T> {
    fn drop(&mut self) {
        if let Some(task) = self.supervisor.get_mut().take() {
            task.abort();
        }
        if let Some(link) = lock(&self.shared.link).take() {
            link.reader.abort();
        }
    }
}
