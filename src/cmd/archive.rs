//! `srclib export`, `srclib import` and `srclib deploy`.

use std::{fs::File, io::BufReader, path::Path};

use console::style;

use super::open_library;
use crate::{Error, Result};

pub fn export(dest_dir: &Path, preview: bool) -> Result<()> {
   let library = open_library()?;
   let path = if preview { library.preview().export(dest_dir)? } else { library.export(dest_dir)? };
   println!("{} {}", style("Exported").green(), path.display());
   Ok(())
}

pub fn import(archive: &Path) -> Result<()> {
   let library = open_library()?;
   library.import(archive)?;
   println!("{} {}", style("Imported").green(), archive.display());
   Ok(())
}

pub fn deploy(languages: &Path, archive: &Path) -> Result<()> {
   let library = open_library()?;
   let languages = File::open(languages).map_err(|e| Error::storage("deploy", languages, e))?;
   let archive = File::open(archive).map_err(|e| Error::storage("deploy", archive, e))?;
   library.deploy_default_library(BufReader::new(languages), BufReader::new(archive))?;
   println!("{}", style("Default library deployed").green());
   Ok(())
}
