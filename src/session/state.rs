//! 单个对话会话的状态：消息历史与本次会话的上传 / 生成产物

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::content::{DraftPair, OptionKey, Platform};
use crate::memory::{ContentBlock, Message, MessageLog, Role};

/// 独立生成图（不属于某个选项）的键
pub const STANDALONE_MEDIA: &str = "standalone";

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Local>,
    messages: MessageLog,
    /// 用户上传的照片；品牌滤镜原地替换
    pub uploaded_media: Option<Vec<u8>>,
    pub generated_options: Option<DraftPair>,
    /// option_a / option_b / standalone → 图片字节，同键覆盖
    pub generated_media: BTreeMap<String, Vec<u8>>,
    pub approved_option: Option<OptionKey>,
    pub platform: Option<Platform>,
    pub topic: Option<String>,
    /// 本次会话的修改请求，批准时写入偏好条目
    pub revision_notes: Vec<String>,
    /// 刚按下 revise 按钮、尚未收到反馈的那条记录
    pending_revision: Option<usize>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let started_at = Local::now();
        let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(6).collect();
        Self {
            id: format!("sess_{}_{}", started_at.format("%Y%m%d_%H%M%S"), suffix),
            started_at,
            messages: MessageLog::new(),
            uploaded_media: None,
            generated_options: None,
            generated_media: BTreeMap::new(),
            approved_option: None,
            platform: None,
            topic: None,
            revision_notes: Vec::new(),
            pending_revision: None,
        }
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// 历史只能追加
    pub fn push_message(&mut self, msg: Message) {
        self.messages.append(msg);
    }

    /// 第一条用户文本（归档兜底摘要用）
    pub fn first_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .flat_map(|m| m.content.iter())
            .find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
    }

    /// 记录修改请求：`[BUTTON: revise_a|revise_b]` 记一条 "Revise A"，
    /// 紧随其后的文字反馈并入这条记录
    pub fn note_user_input(&mut self, content: &[ContentBlock]) {
        let text = content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.trim()),
                _ => None,
            })
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return;
        }

        if let Some(data) = button_data(&text) {
            self.pending_revision = match data {
                "revise_a" => Some(self.push_revision(OptionKey::A)),
                "revise_b" => Some(self.push_revision(OptionKey::B)),
                _ => None,
            };
            return;
        }
        if let Some(idx) = self.pending_revision.take() {
            if let Some(note) = self.revision_notes.get_mut(idx) {
                note.push_str(": ");
                note.push_str(&text);
            }
        }
    }

    /// 批准后清空，下一篇重新累计
    pub fn take_revision_notes(&mut self) -> Vec<String> {
        self.pending_revision = None;
        std::mem::take(&mut self.revision_notes)
    }

    fn push_revision(&mut self, key: OptionKey) -> usize {
        self.revision_notes.push(format!("Revise {}", key.upper()));
        self.revision_notes.len() - 1
    }

    /// 某选项可用于发布的图片：该选项生成图优先，其次用户上传
    pub fn media_for(&self, key: OptionKey) -> Option<&[u8]> {
        self.generated_media
            .get(key.label())
            .or(self.uploaded_media.as_ref())
            .map(Vec::as_slice)
    }
}

/// `[BUTTON: data]` → data
fn button_data(text: &str) -> Option<&str> {
    text.strip_prefix("[BUTTON:")?
        .strip_suffix(']')
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let session = Session::new();
        let parts: Vec<&str> = session.id.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "sess");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 6);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_first_user_text_skips_non_text() {
        let mut session = Session::new();
        session.push_message(Message::new(
            Role::User,
            vec![ContentBlock::image("image/png", vec![1])],
        ));
        session.push_message(Message::assistant("hi"));
        session.push_message(Message::user("write about mornings"));
        assert_eq!(session.first_user_text(), Some("write about mornings"));
    }

    #[test]
    fn test_revise_press_collects_following_feedback() {
        let mut session = Session::new();
        session.note_user_input(&[ContentBlock::text("write about rest")]);
        assert!(session.revision_notes.is_empty());

        session.note_user_input(&[ContentBlock::text("[BUTTON: revise_b]")]);
        assert_eq!(session.revision_notes, vec!["Revise B"]);
        session.note_user_input(&[ContentBlock::text("make it shorter")]);
        session.note_user_input(&[ContentBlock::text("and warmer")]);
        assert_eq!(session.revision_notes, vec!["Revise B: make it shorter"]);

        // 按下后直接换成别的按钮，记录保持原样
        session.note_user_input(&[ContentBlock::text("[BUTTON: revise_a]")]);
        session.note_user_input(&[ContentBlock::text("[BUTTON: pick_a]")]);
        session.note_user_input(&[ContentBlock::image("image/png", vec![1])]);
        assert_eq!(
            session.revision_notes,
            vec!["Revise B: make it shorter", "Revise A"]
        );

        assert_eq!(session.take_revision_notes().len(), 2);
        assert!(session.revision_notes.is_empty());
        session.note_user_input(&[ContentBlock::text("more personal")]);
        assert!(session.revision_notes.is_empty());
    }

    #[test]
    fn test_media_for_prefers_generated() {
        let mut session = Session::new();
        assert!(session.media_for(OptionKey::A).is_none());
        session.uploaded_media = Some(vec![1]);
        assert_eq!(session.media_for(OptionKey::A), Some(&[1u8][..]));
        session
            .generated_media
            .insert(OptionKey::A.label().to_string(), vec![2]);
        assert_eq!(session.media_for(OptionKey::A), Some(&[2u8][..]));
        assert_eq!(session.media_for(OptionKey::B), Some(&[1u8][..]));
    }
}
