use color_eyre::eyre::{self, WrapErr};
use log::debug;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tera::Tera;

pub fn render(tera: &Tera, template_name: &str, context: &tera::Context) -> eyre::Result<String> {
    Ok(tera.render(template_name, context)?)
}

pub fn render_to(
    tera: &Tera,
    template_name: &str,
    context: &tera::Context,
    write: impl Write,
) -> eyre::Result<()> {
    Ok(tera.render_to(template_name, context, write)?)
}

/// Renders a template into a file, creating the parent directory if needed
///
/// The output is written next to the target and renamed over it so a browser polling the file
/// never reads a half written page.
pub fn write_template(
    tera: &Tera,
    template_name: &str,
    context: &tera::Context,
    file_path: &Path,
) -> eyre::Result<()> {
    debug!("writing template {} to file: {:?}", template_name, file_path);
    let contents = render(tera, template_name, context)?;
    write_atomically(file_path, contents.as_bytes())
}

/// Writes `contents` to a temporary sibling of `file_path` and renames it into place
pub fn write_atomically(file_path: &Path, contents: &[u8]) -> eyre::Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("could not create output dir: {:?}", parent))?;
    }

    let temp_path = file_path.with_extension("tmp");
    let mut output_file = File::create(&temp_path)
        .wrap_err_with(|| format!("could not create file: {:?}", temp_path))?;
    output_file.write_all(contents)?;
    output_file.sync_all()?;
    fs::rename(&temp_path, file_path)
        .wrap_err_with(|| format!("could not move {:?} to {:?}", temp_path, file_path))
}
