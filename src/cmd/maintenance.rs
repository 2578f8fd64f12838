//! `srclib update-all`, `srclib destroy`, `srclib delete` and `srclib status`.

use console::style;

use super::{cancel_on_ctrl_c, download::report, open_library, progress_bar};
use crate::{
   Result,
   util::{format_size, get_dir_size},
};

pub async fn update_all() -> Result<()> {
   let library = open_library()?;
   let cancel = cancel_on_ctrl_c();

   let mut projects = progress_bar("Updating");
   let mut steps = progress_bar("Resource");
   let outcome = library
      .update_all(&mut projects, &mut steps, &cancel)
      .await?;
   steps.finish_and_clear();
   projects.finish_and_clear();
   report(&outcome)
}

pub fn destroy() -> Result<()> {
   let library = open_library()?;
   library.destroy_indexes()?;
   println!("{}", style("Indexes removed; target languages kept").green());
   Ok(())
}

pub fn delete_project(project_id: &str) -> Result<()> {
   let library = open_library()?;
   library.delete_project(project_id)?;
   println!("{} {}", style("Removed").green(), project_id);
   Ok(())
}

pub fn status() -> Result<()> {
   let library = open_library()?;
   let opts = library.options();

   println!("{}", style("Library:").bold());
   println!("  deployed:  {}", library.exists()?);
   println!("  languages: {}", library.target_languages()?.len());
   for index in [library.app_index(), library.server_index(), library.download_index()] {
      let size = get_dir_size(index.root()).unwrap_or(0);
      println!(
         "  {:<10} {:>4} projects  {:>9}  {}",
         format!("{}:", index.name()),
         index.projects()?.len(),
         format_size(size),
         style(index.root().display()).dim()
      );
   }
   println!("  cache dir: {}", style(opts.cache_dir.display()).dim());
   Ok(())
}
