use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::capture::{CaptureResult, CaptureStore, StoredCapture};
use crate::db::{
    helpers::{format_datetime, parse_datetime, sanitize_file_stem},
    CaptureDatabase,
};

fn row_to_capture(row: &Row) -> Result<StoredCapture> {
    let captured_at: String = row.get("captured_at")?;
    let spans_json: String = row.get("text_spans_json")?;
    let context_json: String = row.get("context_json")?;
    let image_png: Vec<u8> = row.get("image_png")?;

    Ok(StoredCapture {
        id: row.get("id")?,
        title: row.get("title")?,
        result: CaptureResult {
            image_bytes: Arc::new(image_png),
            recognized_text: row.get("recognized_text")?,
            text_spans: serde_json::from_str(&spans_json)
                .context("failed to decode text_spans_json")?,
            app_name: row.get("app_name")?,
            window_title: row.get("window_title")?,
            context: serde_json::from_str(&context_json)
                .context("failed to decode context_json")?,
            captured_at: parse_datetime(&captured_at, "captured_at")?,
        },
    })
}

#[async_trait]
impl CaptureStore for CaptureDatabase {
    async fn save(&self, result: &CaptureResult) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let title = result.title();
        let spans_json =
            serde_json::to_string(&result.text_spans).context("failed to encode text spans")?;
        let context_json =
            serde_json::to_string(&result.context).context("failed to encode context")?;
        let record = result.clone();
        let row_id = id.clone();

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO captures (id, captured_at, app_name, window_title, title, recognized_text, text_spans_json, context_json, image_png)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row_id,
                    format_datetime(&record.captured_at),
                    record.app_name,
                    record.window_title,
                    title,
                    record.recognized_text,
                    spans_json,
                    context_json,
                    record.image_bytes.as_slice(),
                ],
            )
            .context("failed to insert capture")?;
            Ok(())
        })
        .await?;

        Ok(id)
    }

    async fn fetch_all(&self) -> Result<Vec<StoredCapture>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, captured_at, app_name, window_title, title, recognized_text, text_spans_json, context_json, image_png
                 FROM captures
                 ORDER BY captured_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut captures = Vec::new();
            while let Some(row) = rows.next()? {
                captures.push(row_to_capture(row)?);
            }

            Ok(captures)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM captures WHERE id = ?1", params![id])
                .context("failed to delete capture")?;
            if removed == 0 {
                bail!("no capture with id {id}");
            }
            Ok(())
        })
        .await
    }

    async fn export(&self, id: &str, dir: &Path) -> Result<PathBuf> {
        let lookup_id = id.to_string();
        let found = self
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT title, image_png FROM captures WHERE id = ?1",
                        params![lookup_id],
                        |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
                    )
                    .optional()?)
            })
            .await?;

        let Some((title, image_png)) = found else {
            bail!("no capture with id {id}");
        };

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;

        let stem = sanitize_file_stem(&title);
        let mut path = dir.join(format!("{stem}.png"));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let short_id: String = id.chars().take(8).collect();
            path = dir.join(format!("{stem}-{short_id}.png"));
        }

        tokio::fs::write(&path, image_png)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(path)
    }
}
