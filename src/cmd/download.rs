//! `srclib download` and `srclib get`.

use console::style;

use super::{cancel_on_ctrl_c, open_library, progress_bar};
use crate::{Error, Result, SyncOutcome, index::SourceTranslation};

/// Downloads pending updates, or everything the server offers with `all`.
pub async fn execute(all: bool) -> Result<()> {
   let library = open_library()?;
   let cancel = cancel_on_ctrl_c();

   let mut projects = progress_bar("Projects");
   let mut steps = progress_bar("Resource");
   let outcome = if all {
      library
         .download_all_projects(&mut projects, &mut steps, &cancel)
         .await?
   } else {
      let updates = library.available_updates()?;
      if updates.is_empty() {
         println!("{}", style("Nothing to download; run `srclib check` first").dim());
         return Ok(());
      }
      library
         .download_updates(&updates, &mut projects, &mut steps, &cancel)
         .await?
   };
   steps.finish_and_clear();
   projects.finish_and_clear();

   report(&outcome)
}

/// Downloads a single `{project}-{language}-{resource}`.
pub async fn execute_one(id: &str) -> Result<()> {
   let Some(st) = SourceTranslation::parse_id(id) else {
      return Err(Error::InvalidId(id.to_string()));
   };
   let library = open_library()?;
   let cancel = cancel_on_ctrl_c();

   let mut steps = progress_bar("Downloading");
   let outcome = library
      .download_source_translation(&st, &mut steps, &cancel)
      .await?;
   steps.finish_and_clear();

   report(&outcome)
}

pub(super) fn report(outcome: &SyncOutcome) -> Result<()> {
   for project_id in &outcome.merged_projects {
      println!("  {} {}", style("✓").green(), project_id);
   }
   for st in &outcome.failed {
      println!("  {} {}", style("✗").red(), st);
   }
   if outcome.cancelled {
      return Err(Error::Cancelled);
   }
   if outcome.success {
      println!("{}", style("Download complete").green());
   } else {
      println!("{}", style("Download finished with failures; previous content kept").yellow());
   }
   Ok(())
}
