//! `srclib projects` and `srclib categories`.

use console::style;

use super::open_library;
use crate::{Result, library::CatalogView};

fn view_for(library: &crate::Library, preview: bool) -> CatalogView {
   if preview { library.preview().view().clone() } else { library.view().clone() }
}

/// Lists projects with their title in `language`.
pub fn projects(language: &str, preview: bool, json: bool) -> Result<()> {
   let library = open_library()?;
   let view = view_for(&library, preview);
   let entries = view.categories_flat(language)?;

   if json {
      println!("{}", serde_json::to_string_pretty(&entries)?);
      return Ok(());
   }
   if entries.is_empty() {
      println!("{}", style("No projects").dim());
      return Ok(());
   }
   for entry in entries {
      let has_source = view.project_has_source(&entry.project_id)?;
      let marker = if has_source { style("●").green() } else { style("○").dim() };
      println!(
         "  {} {:<8} {} {}",
         marker,
         entry.project_id,
         entry.title,
         style(format!("({})", entry.source_language_id)).dim()
      );
   }
   Ok(())
}

/// Walks the category tree along `path` and lists the entries below it.
pub fn categories(language: &str, path: &[String], json: bool) -> Result<()> {
   let library = open_library()?;
   let view = library.view();

   let mut parent = None;
   for id in path {
      let level = view.categories(language, parent.as_ref())?;
      let Some(next) = level.into_iter().find(|c| c.id() == id) else {
         println!("{}", style(format!("No category {id:?}")).red());
         return Ok(());
      };
      parent = Some(next);
   }

   let entries = view.categories(language, parent.as_ref())?;
   if json {
      println!("{}", serde_json::to_string_pretty(&entries)?);
      return Ok(());
   }
   for entry in entries {
      let kind = if entry.is_project() { style("project").cyan() } else { style("category").yellow() };
      println!("  {:<10} {:<10} {}", kind, entry.id(), entry.title);
   }
   Ok(())
}
