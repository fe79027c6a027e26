use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use anyhow::{anyhow, Result};
use tiny_http::Server;

use crate::logging::{log_error, log_info};

/// Handle on a running options host. Stopping (or dropping) unblocks the
/// accept loop and joins its thread.
pub struct HttpHostControl {
    server: Arc<Server>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    url: String,
}

impl HttpHostControl {
    pub fn new(
        server: Arc<Server>,
        running: Arc<AtomicBool>,
        thread: JoinHandle<()>,
        url: String,
    ) -> Self {
        running.store(true, Ordering::SeqCst);
        Self {
            server,
            running,
            thread: Some(thread),
            url,
        }
    }

    /// Base URL including the configured base path, without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.server.unblock();
            log_info("options host stopping", None, Some(serde_json::json!({ "url": self.url })));
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log_error(
                    "options host accept loop panicked",
                    Some(serde_json::json!({ "url": self.url })),
                    Some(serde_json::json!({ "module": "http" })),
                );
                return Err(anyhow!("options host accept loop for {} panicked", self.url));
            }
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for HttpHostControl {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn control(thread: JoinHandle<()>) -> HttpHostControl {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        HttpHostControl::new(server, Arc::new(AtomicBool::new(true)), thread, "http://test".into())
    }

    #[test]
    fn stop_reports_a_panicked_accept_loop() {
        let mut host = control(thread::spawn(|| panic!("accept loop failure")));
        let err = host.stop().unwrap_err();
        assert!(err.to_string().contains("panicked"));
        assert!(!host.is_running());
        assert!(host.stop().is_ok());
    }

    #[test]
    fn stop_after_clean_exit_is_ok() {
        let mut host = control(thread::spawn(|| {}));
        assert!(host.stop().is_ok());
        assert!(!host.is_running());
    }
}
