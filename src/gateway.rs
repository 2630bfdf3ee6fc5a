//! Rotator gateway: serves one control client on behalf of the dish.
//!
//! The gateway owns the dish client and a TCP listener. It accepts exactly
//! one client per lifetime and handles its requests strictly in sequence,
//! one reply per request, until the client sends `S` or disconnects.

use crate::config::GatewayConfig;
use crate::constants::{ACCEPT_POLL_INTERVAL_MS, MAX_REQUEST_BYTES};
use crate::error::{Result, RotatorError};
use crate::protocol::Winegard;
use crate::request::{Reply, Request};
use crate::transport::{SerialTransport, Transport};
use log::{debug, info, warn};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Gateway lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Idle,
    Listening,
    Connected,
    Processing,
    Closed,
}

/// Cancels a pending [`RotatorGateway::listen`] from another thread
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RotatorGateway<T: Transport = SerialTransport> {
    device: Winegard<T>,
    bind_address: String,
    listener: Option<TcpListener>,
    connection: Option<TcpStream>,
    state: GatewayState,
    shutdown: ShutdownHandle,
}

impl RotatorGateway<SerialTransport> {
    /// Create a gateway for the configured serial dish
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        let mut device = Winegard::new(&config.device.serial_port);
        device.set_offset_angle(config.device.offset_angle);
        Ok(Self::with_device(device, config.bind_address()))
    }
}

impl<T: Transport> RotatorGateway<T> {
    /// Create a gateway around an existing dish client
    pub fn with_device(device: Winegard<T>, bind_address: impl Into<String>) -> Self {
        Self {
            device,
            bind_address: bind_address.into(),
            listener: None,
            connection: None,
            state: GatewayState::Idle,
            shutdown: ShutdownHandle::default(),
        }
    }

    pub fn state(&self) -> GatewayState {
        self.state
    }

    pub fn device(&self) -> &Winegard<T> {
        &self.device
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Address the listener is bound to, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Connect to the dish and enter the motor menu
    pub fn connect(&mut self) -> Result<()> {
        info!("Performing connect");
        self.device.connect()?;
        self.device.quit_menu()?;
        self.device.enter_motor_menu()?;
        Ok(())
    }

    /// Bind the listener without waiting for a client
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.bind_address)?;
        listener.set_nonblocking(true)?;
        let address = listener.local_addr()?;

        self.listener = Some(listener);
        self.state = GatewayState::Listening;
        info!("Listening on {}", address);
        Ok(address)
    }

    /// Wait for the single client, binding first if needed.
    ///
    /// Returns [`RotatorError::Cancelled`] if the shutdown handle fires
    /// before a client arrives.
    pub fn listen(&mut self) -> Result<SocketAddr> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = self.listener.as_ref().ok_or(RotatorError::NotConnected)?;
        info!("Performing listen...");

        let (stream, address) = loop {
            if self.shutdown.is_shutdown() {
                info!("Listen cancelled");
                return Err(RotatorError::Cancelled);
            }
            match listener.accept() {
                Ok(accepted) => break accepted,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(ACCEPT_POLL_INTERVAL_MS));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        stream.set_nonblocking(false)?;
        info!("Connected with {}", address);
        self.connection = Some(stream);
        self.state = GatewayState::Connected;
        Ok(address)
    }

    /// Serve the accepted client until it stops or disconnects
    pub fn process(&mut self) -> Result<()> {
        let mut stream = self.connection.take().ok_or(RotatorError::NotConnected)?;
        let result = self.serve(&mut stream);
        self.connection = Some(stream);
        result
    }

    /// Request/reply loop over any byte stream.
    ///
    /// Each read is decoded as one request and answered with exactly one
    /// reply. A zero-length read means the peer closed the connection.
    pub fn serve<S: Read + Write>(&mut self, stream: &mut S) -> Result<()> {
        info!("Processing commands");
        self.state = GatewayState::Processing;
        let mut buffer = [0u8; MAX_REQUEST_BYTES];

        loop {
            let n = match stream.read(&mut buffer) {
                Ok(0) => {
                    info!("Client disconnected");
                    return Ok(());
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            let request = Request::parse(&buffer[..n]);
            let reply = self.dispatch(&request);
            stream.write_all(reply.to_string().as_bytes())?;
            stream.flush()?;

            if matches!(request, Ok(Request::Stop)) {
                return Ok(());
            }
        }
    }

    fn dispatch(&mut self, request: &Result<Request>) -> Reply {
        match request {
            Ok(Request::GetPosition) => match self.device.get_angles() {
                Ok(reading) => Reply::Position(reading),
                Err(e) => {
                    warn!("Unable to get position: {}", e);
                    Reply::failure()
                }
            },
            Ok(Request::SetPosition { azimuth, elevation }) => {
                match self.device.set_position(*azimuth, *elevation) {
                    Ok(()) => Reply::success(),
                    Err(e) => {
                        warn!("Unable to set position: {}", e);
                        Reply::failure()
                    }
                }
            }
            Ok(Request::Stop) => {
                info!("Stop command received");
                Reply::success()
            }
            Err(e @ RotatorError::UnknownRequest(_)) => {
                warn!("{}", e);
                Reply::failure()
            }
            Err(e) => {
                debug!("Rejecting request: {}", e);
                Reply::failure()
            }
        }
    }

    /// Disconnect the dish and release both sockets; safe on every path
    pub fn cleanup(&mut self) {
        info!("Performing cleanup");
        self.device.disconnect();
        self.connection = None;
        self.listener = None;
        self.state = GatewayState::Closed;
    }

    /// Run one full session: connect, listen, process, then clean up
    pub fn run(&mut self) -> Result<()> {
        let result = self.session();
        self.cleanup();
        result
    }

    fn session(&mut self) -> Result<()> {
        self.connect()?;
        self.listen()?;
        self.process()
    }
}

impl<T: Transport> Drop for RotatorGateway<T> {
    fn drop(&mut self) {
        if self.state != GatewayState::Closed {
            self.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use std::collections::VecDeque;
    use std::io;

    /// In-memory client: one queued chunk per read, then end of stream
    struct ScriptedClient {
        requests: VecDeque<Vec<u8>>,
        replies: Vec<u8>,
    }

    impl ScriptedClient {
        fn new(requests: &[&str]) -> Self {
            Self {
                requests: requests.iter().map(|r| r.as_bytes().to_vec()).collect(),
                replies: Vec::new(),
            }
        }

        fn replies(&self) -> String {
            String::from_utf8_lossy(&self.replies).into_owned()
        }
    }

    impl Read for ScriptedClient {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.requests.pop_front() {
                Some(request) => {
                    let n = request.len().min(buf.len());
                    buf[..n].copy_from_slice(&request[..n]);
                    Ok(n)
                }
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedClient {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.replies.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Transport already scripted for the connect sequence
    fn motor_script() -> MockTransport {
        MockTransport::new().respond("q\r\n>").respond("mot\r\nMOT>")
    }

    fn connected(transport: MockTransport) -> RotatorGateway<MockTransport> {
        let mut gateway = RotatorGateway::with_device(Winegard::with_transport(transport), "127.0.0.1:0");
        gateway.connect().unwrap();
        gateway
    }

    #[test]
    fn connect_enters_motor_menu() {
        let gateway = connected(motor_script());
        assert_eq!(gateway.device().transport().written(), ["q\r", "mot\r"]);
        assert_eq!(
            gateway.device().menu_context(),
            Some(crate::types::MenuContext::Motor)
        );
    }

    #[test]
    fn connect_fails_if_menu_step_fails() {
        let transport = MockTransport::new().respond(">").timeout();
        let mut gateway = RotatorGateway::with_device(Winegard::with_transport(transport), "127.0.0.1:0");
        assert!(matches!(gateway.connect(), Err(RotatorError::Timeout)));
    }

    #[test]
    fn get_position_reply() {
        let transport = motor_script().respond("a\r\nAngle[0] = 123.40\r\nAngle[1] = 45.60\r\nMOT>");
        let mut gateway = connected(transport);
        let mut client = ScriptedClient::new(&["p\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "123.4\n45.6\n");
    }

    #[test]
    fn get_position_failure_reply() {
        let mut gateway = connected(motor_script().timeout());
        let mut client = ScriptedClient::new(&["p\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 1\n");
    }

    #[test]
    fn set_position_issues_both_moves() {
        let mut gateway = connected(motor_script().respond("MOT>").respond("MOT>"));
        let mut client = ScriptedClient::new(&["P 10 20\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 0\n");
        assert_eq!(
            &gateway.device().transport().written()[2..],
            ["a 0 10\r", "a 1 20\r"]
        );
    }

    #[test]
    fn set_position_fails_if_either_move_fails() {
        let mut gateway = connected(motor_script().timeout().respond("MOT>"));
        let mut client = ScriptedClient::new(&["P 10 20\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 1\n");
        // elevation is still attempted after the azimuth failure
        assert_eq!(gateway.device().transport().written().len(), 4);
    }

    #[test]
    fn set_position_wrong_arity_does_not_move() {
        let mut gateway = connected(motor_script());
        let mut client = ScriptedClient::new(&["P 10\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 1\n");
        assert_eq!(gateway.device().transport().written().len(), 2);
    }

    #[test]
    fn non_finite_angles_are_refused_without_moving() {
        let mut gateway = connected(motor_script());
        let mut client = ScriptedClient::new(&["P nan inf\n", "P 10 NaN\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 1\nRPRT 1\n");
        assert_eq!(gateway.device().transport().written(), ["q\r", "mot\r"]);
    }

    #[test]
    fn stop_ends_session_without_further_reads() {
        let mut gateway = connected(motor_script());
        let mut client = ScriptedClient::new(&["S\n", "p\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 0\n");
        assert_eq!(client.requests.len(), 1);
    }

    #[test]
    fn unknown_and_empty_requests_keep_session_alive() {
        let mut gateway = connected(motor_script());
        let mut client = ScriptedClient::new(&["bogus\n", "\n", "S\n"]);
        gateway.serve(&mut client).unwrap();
        assert_eq!(client.replies(), "RPRT 1\nRPRT 1\nRPRT 0\n");
    }

    #[test]
    fn peer_disconnect_ends_session() {
        let mut gateway = connected(motor_script());
        let mut client = ScriptedClient::new(&[]);
        gateway.serve(&mut client).unwrap();
        assert!(client.replies().is_empty());
        assert_eq!(gateway.state(), GatewayState::Processing);
    }

    #[test]
    fn process_without_client_fails() {
        let mut gateway = connected(motor_script());
        assert!(matches!(gateway.process(), Err(RotatorError::NotConnected)));
    }

    #[test]
    fn cleanup_is_safe_when_never_connected() {
        let mut gateway = RotatorGateway::with_device(
            Winegard::with_transport(MockTransport::new()),
            "127.0.0.1:0",
        );
        gateway.cleanup();
        gateway.cleanup();
        assert_eq!(gateway.state(), GatewayState::Closed);
    }

    #[test]
    fn cleanup_disconnects_device() {
        let mut gateway = connected(motor_script());
        gateway.cleanup();
        assert!(!gateway.device().is_connected());
        assert_eq!(gateway.state(), GatewayState::Closed);
    }
}
