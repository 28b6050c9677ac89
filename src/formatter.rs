//! Article-to-Markdown formatting.
//!
//! Two strategies: a line classifier driven by a few regex heuristics, and a
//! prompt that hands the article to the chat-completions service.

use regex::Regex;
use std::sync::LazyLock;

/// Lines that start with a Chinese or Arabic ordinal followed by `、` or `.`.
static SECTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[一二三四五六七八九十\d]+[、.]").unwrap());

/// Short lines without a terminating full stop are treated as headings.
const SHORT_LINE_CHARS: usize = 30;

/// How an article was formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMethod {
    Rule,
    Ai,
}

impl FormatMethod {
    /// Label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rule => "规则排版",
            Self::Ai => "AI排版",
        }
    }
}

/// Classification of a single non-empty line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading2,
    Heading3,
    Paragraph,
}

/// Classify a trimmed, non-empty line.
pub fn classify_line(line: &str) -> LineKind {
    if SECTION_PREFIX.is_match(line) {
        LineKind::Heading2
    } else if line.ends_with('：') || line.ends_with(':') {
        LineKind::Heading3
    } else if line.chars().count() < SHORT_LINE_CHARS && !line.ends_with('。') {
        LineKind::Heading2
    } else {
        LineKind::Paragraph
    }
}

/// Convert plain article text into Markdown using line heuristics.
///
/// Every non-empty line becomes a `##` heading, a `###` heading or a
/// paragraph, and is followed by a blank line.
pub fn format_text_to_markdown(text: &str) -> String {
    let mut formatted = Vec::new();

    for line in text.trim().split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match classify_line(line) {
            LineKind::Heading2 => formatted.push(format!("## {}", line)),
            LineKind::Heading3 => formatted.push(format!("### {}", line)),
            LineKind::Paragraph => formatted.push(line.to_string()),
        }
        formatted.push(String::new());
    }

    formatted.join("\n")
}

/// Build the user prompt asking the model to lay out an article as Markdown.
pub fn ai_format_prompt(text: &str) -> String {
    format!(
        "请将以下文章内容格式化为适合微信公众号发布的Markdown格式。要求：\n\
         \n\
         1. 识别并标记标题层级（使用 # ## ### 等）\n\
         2. 保持段落结构清晰\n\
         3. 适当添加强调和重点标记\n\
         4. 保持原文内容不变，只调整格式\n\
         5. 确保排版美观易读\n\
         \n\
         原文内容：\n\
         {}\n\
         \n\
         请直接返回格式化后的Markdown内容，不要添加任何解释或说明。",
        text
    )
}

static OUTER_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z]*\n(.*)\n```$").unwrap());

/// Remove a single outer code fence wrapped around model output.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match OUTER_FENCE.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbered_sections_become_level_two() {
        assert_eq!(classify_line("一、背景介绍"), LineKind::Heading2);
        assert_eq!(classify_line("十二.总结"), LineKind::Heading2);
        assert_eq!(classify_line("3. A fairly long numbered line that keeps going on and on."), LineKind::Heading2);
    }

    #[test]
    fn lines_ending_with_colon_become_level_three() {
        assert_eq!(classify_line("我们需要注意以下几点："), LineKind::Heading3);
        assert_eq!(classify_line("Things to note:"), LineKind::Heading3);
    }

    #[test]
    fn short_lines_without_full_stop_are_headings() {
        assert_eq!(classify_line("项目进展"), LineKind::Heading2);
        assert_eq!(classify_line("这是一句短句。"), LineKind::Paragraph);
    }

    #[test]
    fn length_is_counted_in_characters() {
        // 29 CJK characters: 87 bytes but still short.
        let line: String = "字".repeat(29);
        assert_eq!(classify_line(&line), LineKind::Heading2);

        let line: String = "字".repeat(30);
        assert_eq!(classify_line(&line), LineKind::Paragraph);
    }

    #[test]
    fn formats_mixed_article() {
        let input = "\n  一、引言  \n\n今天我们来聊一聊Rust语言在服务端开发中的实践经验，以及一些踩过的坑。\n主要内容：\n小结\n";
        let expected = "## 一、引言\n\
                        \n\
                        今天我们来聊一聊Rust语言在服务端开发中的实践经验，以及一些踩过的坑。\n\
                        \n\
                        ### 主要内容：\n\
                        \n\
                        ## 小结\n";

        assert_eq!(format_text_to_markdown(input), expected);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(format_text_to_markdown(""), "");
        assert_eq!(format_text_to_markdown("   \n\n  "), "");
    }

    #[test]
    fn formatting_is_deterministic() {
        let input = "标题\n正文内容比较长，一共超过了三十个字符，所以它会被当作普通段落来处理。";
        assert_eq!(format_text_to_markdown(input), format_text_to_markdown(input));
    }

    #[test]
    fn handles_crlf_line_endings() {
        assert_eq!(format_text_to_markdown("标题\r\n"), "## 标题\n");
    }

    #[test]
    fn ai_prompt_embeds_article() {
        let prompt = ai_format_prompt("文章正文");
        assert!(prompt.contains("原文内容：\n文章正文\n"));
        assert!(prompt.ends_with("不要添加任何解释或说明。"));
    }

    #[test]
    fn strips_markdown_fence() {
        assert_eq!(strip_code_fences("```markdown\n# 标题\n\n正文\n```"), "# 标题\n\n正文");
        assert_eq!(strip_code_fences("  # 标题  "), "# 标题");
    }

    #[test]
    fn method_labels() {
        assert_eq!(FormatMethod::Rule.label(), "规则排版");
        assert_eq!(FormatMethod::Ai.label(), "AI排版");
    }
}
