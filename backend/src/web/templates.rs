//! HTML templates embedded into the binary and rendered with minijinja.

use crate::error::AppError;
use include_dir::{include_dir, Dir};
use minijinja::Environment;
use serde::Serialize;

static TEMPLATE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Compiled template set, shared by all workers as `web::Data`.
pub struct Templates {
    env: Environment<'static>,
}

fn register_dir(env: &mut Environment<'static>, dir: &'static Dir<'static>) -> Result<(), AppError> {
    for file in dir.files() {
        let name = file.path().to_string_lossy().replace('\\', "/");
        let source = file
            .contents_utf8()
            .ok_or_else(|| AppError::Internal(format!("template {} is not UTF-8", name)))?;
        env.add_template_owned(name, source.to_owned())?;
    }
    for sub in dir.dirs() {
        register_dir(env, sub)?;
    }
    Ok(())
}

/// `1234.5` → `1.234,5`; used for HM/KM and durations on pages.
fn id_number(value: f64, decimals: Option<usize>) -> String {
    let formatted = format!("{:.*}", decimals.unwrap_or(1), value);
    formatted.replace('.', ",")
}

impl Templates {
    pub fn load() -> Result<Self, AppError> {
        let mut env = Environment::new();
        register_dir(&mut env, &TEMPLATE_DIR)?;
        env.add_filter("id_number", id_number);
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, AppError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}
