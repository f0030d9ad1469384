// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Argument templates for tool invocations.
//!
//! A placeholder is `{NAME}` where `NAME` is made of ASCII letters, digits,
//! `_` and `.`. Recognised names:
//!
//! | Placeholder      | Rendered as                               |
//! |------------------|-------------------------------------------|
//! | `{task_id}`      | descriptor id                             |
//! | `{output_dir}`   | the task's output directory, absolute     |
//! | `{stage}`        | stage name, e.g. `interface_scoring`      |
//! | `{param.NAME}`   | descriptor parameter `NAME`               |
//! | `{input.NAME}`   | path of descriptor input `NAME`, absolute |
//!
//! Paths are made absolute against the engine's working directory because
//! tools run with their output directory as working directory.
//!
//! Braces around anything else (JSON snippets, shell syntax) are copied as is.
//! A well-formed placeholder that names nothing is an error.

use std::path::Path;

use crate::errors::TaskExecutionFailure;
use crate::traits::ToolInvocation;

/// Render every placeholder in `template` for one invocation.
///
/// # Example
/// ```
/// use the_bindery::backends::render_template;
/// use the_bindery::model::{StageKind, TaskDescriptor};
/// use the_bindery::traits::ToolInvocation;
/// use std::path::Path;
///
/// let descriptor = TaskDescriptor::new("egfr_v60_0", StageKind::Design).with_param("length", 60);
/// let invocation = ToolInvocation {
///     descriptor: &descriptor,
///     output_dir: Path::new("out/design/egfr_v60_0"),
/// };
///
/// let arg = render_template("--length={param.length}", invocation).unwrap();
/// assert_eq!(arg, "--length=60");
/// ```
pub fn render_template(
    template: &str,
    invocation: ToolInvocation<'_>,
) -> Result<String, TaskExecutionFailure> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let name = after
            .find('}')
            .map(|close| &after[..close])
            .filter(|name| is_placeholder(name));

        match name {
            Some(name) => {
                rendered.push_str(&resolve(name, invocation, template)?);
                rest = &after[name.len() + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    Ok(rendered)
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn resolve(
    name: &str,
    invocation: ToolInvocation<'_>,
    template: &str,
) -> Result<String, TaskExecutionFailure> {
    let descriptor = invocation.descriptor;
    let value = match name.split_once('.') {
        None => match name {
            "task_id" => Some(descriptor.id().to_string()),
            "output_dir" => Some(absolute(invocation.output_dir)),
            "stage" => Some(descriptor.stage().to_string()),
            _ => None,
        },
        Some(("param", param)) => descriptor.param(param).map(|v| v.to_string()),
        Some(("input", input)) => descriptor.input(input).map(absolute),
        Some(_) => None,
    };

    value.ok_or_else(|| {
        TaskExecutionFailure::Template(format!(
            "unknown placeholder '{{{}}}' in '{}' for task '{}'",
            name,
            template,
            descriptor.id()
        ))
    })
}

fn absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
