//! CLI command implementations for srclib.
//!
//! Each module corresponds to a subcommand. Commands build a [`Library`]
//! from the global configuration and print results with `console` styling.

pub mod archive;
pub mod browse;
pub mod check;
pub mod download;
pub mod maintenance;

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
   Result, config,
   fetch::HttpTransport,
   library::{Library, LibraryOptions},
};

/// Opens the library described by the global configuration.
pub fn open_library() -> Result<Library> {
   let cfg = config::get();
   cfg.validate()?;
   let transport = Arc::new(HttpTransport::from_config(cfg)?);
   Library::new(LibraryOptions::from_config(cfg), transport)
}

/// Token cancelled on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
   let token = CancellationToken::new();
   let trigger = token.clone();
   tokio::spawn(async move {
      if signal::ctrl_c().await.is_ok() {
         eprintln!("\ncancelling after the current step...");
         trigger.cancel();
      }
   });
   token
}

pub fn progress_bar(prefix: &'static str) -> ProgressBar {
   let pb = ProgressBar::new(0);
   pb.set_style(
      ProgressStyle::default_bar()
         .template("{spinner:.green} {prefix:.bold} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
         .unwrap_or_else(|_| ProgressStyle::default_bar())
         .progress_chars("█▓░"),
   );
   pb.set_prefix(prefix);
   pb
}
