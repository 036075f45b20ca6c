use std::path::PathBuf;

use super::extractor_for;

pub fn run(input_file: PathBuf) -> Result<(), carpeta_core::error::CarpetaError> {
    let bytes = std::fs::read(&input_file)?;
    let extractor = extractor_for(&input_file);
    let text = extractor.extract_text(&bytes)?;
    println!("{text}");
    Ok(())
}
