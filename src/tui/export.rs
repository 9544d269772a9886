use crate::model::SavedRecipe;
use crate::text_summary::build_recipe_summary;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Clipboard worker channel, started on first copy.
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// File-name-safe version of a dish name.
fn slug(name: &str) -> String {
    let s: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let s = s
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if s.is_empty() {
        "recipe".into()
    } else {
        s
    }
}

pub fn export_file_name(r: &SavedRecipe) -> String {
    format!("recipe-{}-{}.json", slug(r.dish_name()), slug(&r.id))
}

/// Write a saved recipe as pretty JSON into `dir`.
pub fn export_recipe_json_to(dir: &Path, r: &SavedRecipe) -> Result<PathBuf> {
    let path = dir.join(export_file_name(r));
    let body = serde_json::to_string_pretty(r).context("serialize recipe")?;
    std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Export into the current directory. Returns the absolute path written.
pub fn export_recipe_json(r: &SavedRecipe) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    export_recipe_json_to(&current_dir, r)
}

/// Start the clipboard worker if needed. Each copy keeps its clipboard
/// handle alive for a while so Linux clipboard managers can read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue the recipe's text form for the clipboard without blocking the UI.
pub fn copy_recipe_to_clipboard(r: &SavedRecipe) -> Result<()> {
    let text = build_recipe_summary(&r.recipe, None).join();
    let sender = init_clipboard_manager()?;
    sender
        .send(text)
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeneratedRecipe;

    fn saved() -> SavedRecipe {
        SavedRecipe {
            id: "65f0c2".into(),
            recipe: GeneratedRecipe {
                dish_name: "Mac & Cheese!".into(),
                ingredients: vec![],
                instructions: vec!["Bake".into()],
            },
        }
    }

    #[test]
    fn file_name_is_slugged() {
        assert_eq!(export_file_name(&saved()), "recipe-mac-cheese-65f0c2.json");
    }

    #[test]
    fn slug_falls_back_for_symbols() {
        assert_eq!(slug("???"), "recipe");
    }

    #[test]
    fn export_writes_round_trippable_json() {
        let dir = std::env::temp_dir().join(format!("recipe-cli-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = export_recipe_json_to(&dir, &saved()).unwrap();
        let back: SavedRecipe =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, saved());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
