use color_eyre::eyre::Result;
use include_dir::{
    include_dir, Dir,
    DirEntry::{Dir as DirEnt, File as FileEnt},
};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use super::page_view::{PageContext, Renderer};
use crate::util::write_template;

static TEMPLATE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates");

pub const PAGE_TEMPLATE: &str = "page.html";
pub const TEXT_TEMPLATE: &str = "page.txt";

/// Loads the custom templates from `custom_dir` and fills in the missing ones from the built in set
pub fn load_templates(custom_dir: &Path) -> Result<Tera> {
    let mut tera = if custom_dir.is_dir() {
        info!("loading custom templates from {:?}...", custom_dir);
        Tera::new(&custom_dir.join("**/*.{html,txt}").to_string_lossy())?
    } else {
        Tera::default()
    };

    info!("loading default templates...");
    let mut default_templates = Tera::default();
    for template in TEMPLATE_DIR.find("**/*")? {
        match template {
            DirEnt(_) => Ok(()),
            FileEnt(t) => match (t.path().to_str(), t.contents_utf8()) {
                (Some(template_name), Some(template_contents)) => {
                    debug!("adding default template: {}", template_name);
                    default_templates.add_raw_template(template_name, template_contents)
                }
                (_, _) => Ok(()),
            },
        }?;
    }

    // custom templates win over the defaults with the same name
    tera.extend(&default_templates)?;
    Ok(tera)
}

/// Rewrites a single HTML file whenever the displayed page changes
///
/// A kiosk browser pointed at the file picks up each page, the `visible` class marks whether the
/// page is faded in.
#[derive(Debug)]
pub struct HtmlRenderer {
    tera: Tera,
    output_path: PathBuf,
    reload_seconds: u64,
    current: Option<PageContext>,
    pending: Option<PageContext>,
}

impl HtmlRenderer {
    pub fn new(tera: Tera, output_path: PathBuf, reload_seconds: u64) -> Self {
        HtmlRenderer {
            tera,
            output_path,
            reload_seconds: reload_seconds.max(1),
            current: None,
            pending: None,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn write(&self, page: &PageContext) -> Result<()> {
        let mut context = Context::new();
        context.insert("page", page);
        context.insert("reload_seconds", &self.reload_seconds);
        write_template(&self.tera, PAGE_TEMPLATE, &context, &self.output_path)
    }
}

impl Renderer for HtmlRenderer {
    fn show(&mut self, page: &PageContext) -> Result<()> {
        let mut page = page.clone();
        page.visible = true;
        self.pending = None;
        self.write(&page)?;
        self.current = Some(page);
        Ok(())
    }

    fn fade_out(&mut self, index: usize) -> Result<()> {
        debug!("fading out page {}", index);
        if let Some(current) = self.current.as_mut() {
            current.visible = false;
        }
        match &self.current {
            Some(current) => self.write(current),
            None => Ok(()),
        }
    }

    fn render_hidden(&mut self, page: &PageContext) -> Result<()> {
        let page = page.clone().hidden();
        self.write(&page)?;
        self.pending = Some(page);
        Ok(())
    }

    fn fade_in(&mut self, index: usize) -> Result<()> {
        debug!("fading in page {}", index);
        let mut page = match self.pending.take() {
            Some(pending) if pending.index == index => pending,
            _ => match self.current.take() {
                Some(current) => current,
                None => return Ok(()),
            },
        };
        page.visible = true;
        self.write(&page)?;
        self.current = Some(page);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.current = None;
        self.pending = None;
        self.write(&PageContext::empty())
    }
}
