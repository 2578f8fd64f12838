//! `srclib check`: refresh the server mirror and list stale resources.

use console::style;

use super::{cancel_on_ctrl_c, open_library, progress_bar};
use crate::Result;

pub async fn execute(json: bool) -> Result<()> {
   let library = open_library()?;
   let cancel = cancel_on_ctrl_c();

   let mut pb = progress_bar("Checking");
   let updates = library.check_for_updates(&mut pb, &cancel).await?;
   pb.finish_and_clear();

   if json {
      println!("{}", serde_json::to_string_pretty(&updates)?);
      return Ok(());
   }

   if updates.is_empty() {
      println!("{}", style("Library is up to date").green());
      return Ok(());
   }

   println!("{}", style(format!("{} update(s) available:", updates.len())).bold());
   for st in updates.iter() {
      println!("  {} {}", style("●").yellow(), st);
   }
   Ok(())
}
