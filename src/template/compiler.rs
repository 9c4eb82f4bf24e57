//! Translate a [`TemplateModel`] into a [`ToastDocument`]

use std::path::Path;

use tracing::debug;

use super::document::{Element, ToastDocument};
use super::model::{AudioOption, Layout, TemplateModel};
use crate::error::CompileError;

/// Template compiler
///
/// `modern_features` comes from the platform capability probe. When it is
/// off, attribution text, actions and audio are never attempted.
#[derive(Debug, Clone, Copy)]
pub struct TemplateCompiler {
    modern_features: bool,
}

impl TemplateCompiler {
    pub fn new(modern_features: bool) -> Self {
        Self { modern_features }
    }

    pub fn modern_features(&self) -> bool {
        self.modern_features
    }

    /// Compile the model. The first failing step aborts and no partial
    /// document is returned.
    pub fn compile(&self, model: &TemplateModel) -> Result<ToastDocument, CompileError> {
        let layout = model.layout();
        let mut document = ToastDocument::skeleton(layout);

        // Counted before attribution adds its own text node.
        let fields_count = model.text_fields_count();
        for (index, text) in model.text_fields().iter().enumerate().take(fields_count) {
            set_text_field(&mut document, layout, text, index)?;
        }

        if self.modern_features {
            if let Some(text) = model.attribution_text() {
                set_attribution_text(&mut document, text)?;
            }

            for (index, label) in model.actions().iter().enumerate() {
                add_action(&mut document, label, &index.to_string())?;
            }

            if model.audio_path().is_some() || model.audio_option() != AudioOption::Default {
                set_audio(&mut document, model.audio_path(), model.audio_option())?;
            }
        } else {
            debug!("Modern features (actions/audio/attribution) not supported, skipping");
        }

        if model.has_image() {
            if let Some(path) = model.image_path() {
                set_image(&mut document, path)?;
            }
        }

        Ok(document)
    }
}

fn set_text_field(
    document: &mut ToastDocument,
    layout: Layout,
    text: &str,
    index: usize,
) -> Result<(), CompileError> {
    document
        .nth_by_tag_mut("text", index)
        .ok_or(CompileError::MissingPlaceholder { layout, index })?
        .set_text(text);
    Ok(())
}

fn set_attribution_text(document: &mut ToastDocument, text: &str) -> Result<(), CompileError> {
    let binding = document
        .nth_by_tag_mut("binding", 0)
        .ok_or(CompileError::MissingElement("binding"))?;
    binding
        .append_child(Element::new("text").with_attr("placement", "attribution"))
        .set_text(text);
    Ok(())
}

fn add_action(document: &mut ToastDocument, label: &str, arguments: &str) -> Result<(), CompileError> {
    if document.first_by_tag("actions").is_none() {
        let toast = document
            .nth_by_tag_mut("toast", 0)
            .ok_or(CompileError::MissingElement("toast"))?;
        toast.set_attr("template", "ToastGeneric");
        toast.set_attr("duration", "short");
        toast.append_child(Element::new("actions"));
    }

    let actions = document
        .nth_by_tag_mut("actions", 0)
        .ok_or(CompileError::MissingElement("actions"))?;
    actions.append_child(
        Element::new("action")
            .with_attr("content", label)
            .with_attr("arguments", arguments),
    );
    Ok(())
}

fn set_audio(
    document: &mut ToastDocument,
    path: Option<&Path>,
    option: AudioOption,
) -> Result<(), CompileError> {
    let mut audio = Element::new("audio");
    if let Some(path) = path {
        audio.set_attr("src", path.to_string_lossy());
    }
    match option {
        AudioOption::Loop => audio.set_attr("loop", "true"),
        AudioOption::Silent => audio.set_attr("silent", "true"),
        AudioOption::Default => {}
    }

    document
        .nth_by_tag_mut("toast", 0)
        .ok_or(CompileError::MissingElement("toast"))?
        .append_child(audio);
    Ok(())
}

fn set_image(document: &mut ToastDocument, path: &Path) -> Result<(), CompileError> {
    document
        .nth_by_tag_mut("image", 0)
        .ok_or(CompileError::MissingElement("image"))?
        .set_attr("src", file_uri(path));
    Ok(())
}

/// `file://` form of an absolute path, for both `/unix` and `C:\windows` paths
pub fn file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.starts_with('/') {
        format!("file://{}", raw)
    } else {
        format!("file:///{}", raw)
    }
}
