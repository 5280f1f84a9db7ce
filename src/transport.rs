//! 控制台传输层：stdin 每行一条输入，动作打印到 stdout，图片写入数据目录
//!
//! 命令：
//! - `/photo <path> [caption]` 上传照片（图片块 + 说明文字）
//! - `/button <data>` 模拟按钮，转为 `[BUTTON: data]`
//! - `/start` 开始新会话，`/end` 结束并归档，`/quit` 退出
//! - 其他文本原样作为用户消息

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::agent::{end_session, process_message, start_session, AgentComponents};
use crate::memory::ContentBlock;
use crate::tools::Action;

/// 控制台输入解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Photo {
        path: PathBuf,
        caption: Option<String>,
    },
    Button(String),
    Start,
    End,
    Quit,
}

/// 解析一行输入；空行返回 None
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    let cmd = match head {
        "/start" => Command::Start,
        "/end" => Command::End,
        "/quit" | "/exit" => Command::Quit,
        "/button" if !rest.is_empty() => Command::Button(rest.to_string()),
        "/photo" if !rest.is_empty() => {
            let (path, caption) = match rest.split_once(char::is_whitespace) {
                Some((p, c)) if !c.trim().is_empty() => (p, Some(c.trim().to_string())),
                Some((p, _)) => (p, None),
                None => (rest, None),
            };
            Command::Photo {
                path: PathBuf::from(path),
                caption,
            }
        }
        _ => Command::Say(line.to_string()),
    };
    Some(cmd)
}

/// 按扩展名判断 MIME，未知时按 JPEG
pub fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// 读取照片并组成用户消息内容
pub async fn photo_blocks(path: &Path, caption: Option<&str>) -> anyhow::Result<Vec<ContentBlock>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read photo {}", path.display()))?;
    let text = caption.unwrap_or("[The creator uploaded a photo]");
    Ok(vec![
        ContentBlock::image(media_type_for(path), data),
        ContentBlock::text(text),
    ])
}

/// 把动作渲染为控制台文本；图片写入 out_dir 并打印路径
pub struct ActionPrinter {
    out_dir: PathBuf,
    photos: usize,
}

impl ActionPrinter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            photos: 0,
        }
    }

    pub async fn render(&mut self, action: &Action) -> anyhow::Result<String> {
        match action {
            Action::Text { text } => Ok(text.clone()),
            Action::Photo { image, caption } => {
                let path = self.save_photo(image).await?;
                Ok(format!("[photo: {}] {}", path.display(), caption))
            }
            Action::Buttons { text, rows } => {
                let mut out = text.clone();
                for row in rows {
                    let row: Vec<String> = row
                        .iter()
                        .map(|b| format!("[{} → /button {}]", b.text, b.data))
                        .collect();
                    out.push('\n');
                    out.push_str(&row.join("  "));
                }
                Ok(out)
            }
        }
    }

    async fn save_photo(&mut self, image: &[u8]) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.out_dir.display()))?;
        self.photos += 1;
        let ext = image::guess_format(image)
            .ok()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("png");
        let name = format!(
            "sora_{}_{:03}.{}",
            chrono::Local::now().format("%Y%m%d_%H%M%S"),
            self.photos,
            ext
        );
        let path = self.out_dir.join(name);
        tokio::fs::write(&path, image)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// 控制台主循环，直到 EOF 或 /quit；退出前归档活动会话
pub async fn run_console(
    components: &AgentComponents,
    user_id: &str,
    out_dir: PathBuf,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut printer = ActionPrinter::new(out_dir);

    write_line(
        &mut stdout,
        "Sora is ready. /photo <path>, /button <data>, /start, /end, /quit",
    )
    .await?;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(cmd) = parse_command(&line) else {
            continue;
        };
        let content = match cmd {
            Command::Quit => break,
            Command::Start => {
                start_session(components, user_id).await;
                write_line(&mut stdout, "New session started.").await?;
                continue;
            }
            Command::End => {
                let ended = end_session(components, user_id).await;
                let msg = if ended {
                    "Session saved. See you next time."
                } else {
                    "No active session."
                };
                write_line(&mut stdout, msg).await?;
                continue;
            }
            Command::Say(text) => vec![ContentBlock::text(text)],
            Command::Button(data) => vec![ContentBlock::text(format!("[BUTTON: {}]", data))],
            Command::Photo { path, caption } => {
                match photo_blocks(&path, caption.as_deref()).await {
                    Ok(blocks) => blocks,
                    Err(e) => {
                        write_line(&mut stdout, &format!("{:#}", e)).await?;
                        continue;
                    }
                }
            }
        };

        let actions = process_message(components, user_id, content).await;
        for action in &actions {
            match printer.render(action).await {
                Ok(text) => write_line(&mut stdout, &text).await?,
                Err(e) => tracing::warn!(error = %e, "failed to render action"),
            }
        }
    }

    end_session(components, user_id).await;
    Ok(())
}

async fn write_line(stdout: &mut tokio::io::Stdout, text: &str) -> anyhow::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n\n").await?;
    stdout.flush().await?;
    Ok(())
}
