/// Operations the SDK needs from a blocking HTTP/1.1 client.
///
/// Integer results of the underlying client are reduced to `bool` success
/// flags; the status code of the last response is queried separately.
pub trait HttpClient {
    /// Keeps the TCP connection open between requests.
    fn set_keep_alive(&mut self, keep_alive: bool);

    /// Opens a connection to `host:port`.
    fn connect(&mut self, host: &str, port: u16) -> bool;

    /// Closes the connection.
    fn stop(&mut self);

    /// Sends a `POST` to `path` with the given content type and body.
    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> bool;

    /// Sends a `GET` to `path`.
    fn get(&mut self, path: &str) -> bool;

    /// Status code of the last response.
    fn response_status_code(&mut self) -> u16;

    /// Body of the last response.
    fn response_body(&mut self) -> &[u8];
}
