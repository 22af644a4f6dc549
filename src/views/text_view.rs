use color_eyre::eyre::Result;
use log::debug;
use std::io::Write;
use tera::{Context, Tera};

use super::html_view::TEXT_TEMPLATE;
use super::page_view::{PageContext, Renderer};
use crate::util::render_to;

/// Prints each page as plain text as soon as it becomes visible
///
/// Fades have no meaning here, only pages that are shown or faded in are printed.
pub struct TextRenderer<W: Write> {
    tera: Tera,
    out: W,
    pending: Option<PageContext>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(tera: Tera, out: W) -> Self {
        TextRenderer {
            tera,
            out,
            pending: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print(&mut self, page: &PageContext) -> Result<()> {
        let mut context = Context::new();
        context.insert("page", page);
        render_to(&self.tera, TEXT_TEMPLATE, &context, &mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn show(&mut self, page: &PageContext) -> Result<()> {
        self.print(page)
    }

    fn fade_out(&mut self, index: usize) -> Result<()> {
        debug!("page {} faded out", index);
        Ok(())
    }

    fn render_hidden(&mut self, page: &PageContext) -> Result<()> {
        self.pending = Some(page.clone());
        Ok(())
    }

    fn fade_in(&mut self, index: usize) -> Result<()> {
        match self.pending.take() {
            Some(page) if page.index == index => self.print(&page),
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<()> {
        self.pending = None;
        writeln!(self.out, "No upcoming events")?;
        Ok(())
    }
}
