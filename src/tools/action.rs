//! 发给传输层的动作：文本、图片、按钮组

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    /// 按下后以 `[BUTTON: data]` 回传
    pub data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Text {
        text: String,
    },
    Photo {
        image: Vec<u8>,
        caption: String,
    },
    Buttons {
        text: String,
        rows: Vec<Vec<Button>>,
    },
}

impl Action {
    pub fn text(text: impl Into<String>) -> Self {
        Action::Text { text: text.into() }
    }

    pub fn photo(image: Vec<u8>, caption: impl Into<String>) -> Self {
        Action::Photo {
            image,
            caption: caption.into(),
        }
    }
}
