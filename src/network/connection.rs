use crate::callback::Callback;

/// Lifecycle of a broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No session and no attempt in progress.
    #[default]
    Disconnected,
    /// A connection attempt has been started.
    Connecting,
    /// The broker accepted the session.
    Connected,
    /// A disconnect has been requested.
    Disconnecting,
    /// The transport reported a failure, see [`ConnectionError`].
    Error,
}

/// Reason for the last transition into [`ConnectionState::Error`].
///
/// The named variants mirror the MQTT 3.1.1 CONNACK return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionError {
    /// No error recorded.
    #[default]
    None,
    /// The broker does not support the requested protocol level.
    RefuseProtocol,
    /// The client identifier was rejected.
    IdRejected,
    /// The broker is unavailable.
    ServerUnavailable,
    /// Malformed username or password.
    BadUsername,
    /// The credentials were not accepted.
    NotAuthorized,
    /// Transport-specific failure code.
    Other(u8),
}

impl From<u8> for ConnectionError {
    fn from(code: u8) -> Self {
        match code {
            0 => ConnectionError::None,
            1 => ConnectionError::RefuseProtocol,
            2 => ConnectionError::IdRejected,
            3 => ConnectionError::ServerUnavailable,
            4 => ConnectionError::BadUsername,
            5 => ConnectionError::NotAuthorized,
            other => ConnectionError::Other(other),
        }
    }
}

/// Connection state machine for transport implementors.
///
/// ```text
/// Disconnected --begin_connect--> Connecting --report_connected--> Connected
/// Connected --begin_disconnect--> Disconnecting --report_disconnected--> Disconnected
/// any --report_error--> Error --begin_connect--> Connecting
/// ```
///
/// Every change of state or error is reported to the single subscriber with
/// the new state and the last error.
#[derive(Debug, Default)]
pub struct ConnectionMonitor<'a> {
    state: ConnectionState,
    last_error: ConnectionError,
    on_change: Callback<'a, (ConnectionState, ConnectionError)>,
}

impl<'a> ConnectionMonitor<'a> {
    /// A monitor in [`ConnectionState::Disconnected`] with no subscriber.
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_error: ConnectionError::None,
            on_change: Callback::empty(),
        }
    }

    /// Installs the state-changed observer, replacing the previous one.
    pub fn subscribe(&mut self, callback: Callback<'a, (ConnectionState, ConnectionError)>) {
        self.on_change = callback;
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Error recorded by the last transition into [`ConnectionState::Error`].
    pub fn last_error(&self) -> ConnectionError {
        self.last_error
    }

    /// Whether the session is established.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// A connection attempt was started. Clears any previous error.
    pub fn begin_connect(&mut self) {
        self.transition(ConnectionState::Connecting, ConnectionError::None);
    }

    /// The broker accepted the session.
    pub fn report_connected(&mut self) {
        self.transition(ConnectionState::Connected, ConnectionError::None);
    }

    /// A disconnect was requested. Ignored unless a session or an attempt
    /// is in progress.
    pub fn begin_disconnect(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            self.transition(ConnectionState::Disconnecting, self.last_error);
        }
    }

    /// The session is gone.
    pub fn report_disconnected(&mut self) {
        self.transition(ConnectionState::Disconnected, self.last_error);
    }

    /// The transport hit a low-level failure.
    pub fn report_error(&mut self, error: ConnectionError) {
        self.transition(ConnectionState::Error, error);
    }

    fn transition(&mut self, state: ConnectionState, error: ConnectionError) {
        if self.state == state && self.last_error == error {
            return;
        }
        debug!("connection state {:?} -> {:?} ({:?})", self.state, state, error);
        self.state = state;
        self.last_error = error;
        self.on_change.call_callback(&(state, error));
    }
}
