//! 按字符（而非字节）截断，中英文混排时不会切断 UTF-8

/// 保留前 max 个字符
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// 保留末尾 max 个字符
pub fn tail_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    s.chars().skip(count - max).collect()
}

/// 超过 max 个字符时截断并追加 "..."
pub fn preview(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", truncate_chars(s, max))
    } else {
        s.to_string()
    }
}
