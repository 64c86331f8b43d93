/// Profiling with puffin behind the `profiling` feature.
#[cfg(feature = "profiling")]
pub use puffin;

/// Starts the puffin server when the `profiling` feature is on.
pub fn init_profiling() {
  #[cfg(feature = "profiling")]
  {
    puffin::set_scopes_on(true);

    let server_addr = "127.0.0.1:8585";
    match puffin_http::Server::new(server_addr) {
      Ok(puffin_server) => {
        log::info!("Puffin server listening on http://{server_addr}");
        log::info!("Connect with `puffin_viewer --url {server_addr}`");
        // Lives until the process exits.
        std::mem::forget(puffin_server);
      }
      Err(e) => {
        log::warn!("Failed to start puffin server: {e}");
      }
    }
  }

  #[cfg(not(feature = "profiling"))]
  {
    log::debug!("Built without the profiling feature");
  }
}

#[macro_export]
macro_rules! profile_scope {
  ($name:expr) => {
    #[cfg(feature = "profiling")]
    $crate::profiling::puffin::profile_scope!($name);
  };
  ($name:expr, $data:expr) => {
    #[cfg(feature = "profiling")]
    $crate::profiling::puffin::profile_scope!($name, $data);
  };
}

/// Closes a puffin frame. Each rendered year is one frame.
pub fn new_frame() {
  #[cfg(feature = "profiling")]
  puffin::GlobalProfiler::lock().new_frame();
}
