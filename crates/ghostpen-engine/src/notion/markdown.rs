//! Conversion between Notion block JSON and plain Markdown.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

/// Notion rejects rich-text items longer than this.
const MAX_TEXT_CHARS: usize = 2000;

static PAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:notion\.so|notion\.site)/(?:.*-)?([a-f0-9]{32})\b").unwrap()
});
static DASHED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-f0-9]{8}-?[a-f0-9]{4}-?[a-f0-9]{4}-?[a-f0-9]{4}-?[a-f0-9]{12}$").unwrap()
});
static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());

/// Pull a 32-hex page id out of a bare id (dashed or not) or a page URL.
pub fn extract_page_id(url_or_id: &str) -> Option<String> {
    let trimmed = url_or_id.trim();
    if DASHED_ID.is_match(trimmed) {
        return Some(trimmed.replace('-', ""));
    }
    PAGE_URL
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn rich_text(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let items: Vec<Value> = if chars.is_empty() {
        vec![json!({"type": "text", "text": {"content": ""}})]
    } else {
        chars
            .chunks(MAX_TEXT_CHARS)
            .map(|chunk| {
                let text: String = chunk.iter().collect();
                json!({"type": "text", "text": {"content": text}})
            })
            .collect()
    };
    Value::Array(items)
}

fn text_block(kind: &str, content: &str) -> Value {
    json!({
        "object": "block",
        "type": kind,
        kind: {"rich_text": rich_text(content)},
    })
}

/// Markdown to Notion children blocks. Unrecognised lines become paragraphs.
pub fn markdown_to_blocks(md: &str) -> Vec<Value> {
    let lines: Vec<&str> = md.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if line.trim().is_empty() {
            continue;
        }

        if let Some(lang) = line.strip_prefix("```") {
            let mut code = Vec::new();
            while i < lines.len() && !lines[i].starts_with("```") {
                code.push(lines[i]);
                i += 1;
            }
            i += 1; // closing fence
            let lang = match lang.trim() {
                "" => "plain text",
                other => other,
            };
            blocks.push(json!({
                "object": "block",
                "type": "code",
                "code": {"rich_text": rich_text(&code.join("\n")), "language": lang},
            }));
            continue;
        }

        let block = if let Some(rest) = line.strip_prefix("### ") {
            text_block("heading_3", rest)
        } else if let Some(rest) = line.strip_prefix("## ") {
            text_block("heading_2", rest)
        } else if let Some(rest) = line.strip_prefix("# ") {
            text_block("heading_1", rest)
        } else if let Some(rest) = line.strip_prefix("> ") {
            text_block("quote", rest)
        } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            text_block("bulleted_list_item", rest)
        } else if let Some(m) = NUMBERED_ITEM.find(line) {
            text_block("numbered_list_item", &line[m.end()..])
        } else if line.trim().len() >= 3 && line.trim().chars().all(|c| c == '-') {
            json!({"object": "block", "type": "divider", "divider": {}})
        } else {
            text_block("paragraph", line)
        };
        blocks.push(block);
    }

    blocks
}

fn rich_text_to_md(items: &Value) -> String {
    let Some(items) = items.as_array() else {
        return String::new();
    };
    items
        .iter()
        .map(|rt| {
            let mut text = rt["plain_text"]
                .as_str()
                .or_else(|| rt["text"]["content"].as_str())
                .unwrap_or_default()
                .to_string();
            let a = &rt["annotations"];
            if a["code"] == true {
                text = format!("`{text}`");
            }
            if a["bold"] == true {
                text = format!("**{text}**");
            }
            if a["italic"] == true {
                text = format!("*{text}*");
            }
            if a["strikethrough"] == true {
                text = format!("~~{text}~~");
            }
            if let Some(href) = rt["href"].as_str() {
                text = format!("[{text}]({href})");
            }
            text
        })
        .collect()
}

fn block_to_md(block: &Value, indent: &str) -> String {
    let kind = block["type"].as_str().unwrap_or_default();
    let data = &block[kind];
    let text = rich_text_to_md(&data["rich_text"]);

    let line = match kind {
        "paragraph" if text.is_empty() => String::new(),
        "paragraph" => format!("{indent}{text}"),
        "heading_1" => format!("# {text}"),
        "heading_2" => format!("## {text}"),
        "heading_3" => format!("### {text}"),
        "bulleted_list_item" => format!("{indent}- {text}"),
        "numbered_list_item" => format!("{indent}1. {text}"),
        "to_do" => {
            let mark = if data["checked"] == true { "x" } else { " " };
            format!("{indent}- [{mark}] {text}")
        }
        "toggle" => format!("{indent}<details><summary>{text}</summary></details>"),
        "quote" => format!("{indent}> {text}"),
        "callout" => format!("> {text}"),
        "code" => {
            let lang = data["language"].as_str().unwrap_or_default();
            format!("```{lang}\n{text}\n```")
        }
        "divider" => "---".to_string(),
        "image" => {
            let url = if data["type"] == "file" {
                data["file"]["url"].as_str()
            } else {
                data["external"]["url"].as_str()
            };
            let caption = rich_text_to_md(&data["caption"]);
            url.map(|u| format!("![{caption}]({u})")).unwrap_or_default()
        }
        "bookmark" => data["url"]
            .as_str()
            .map(|u| format!("[{u}]({u})"))
            .unwrap_or_default(),
        _ => text,
    };

    let children: Vec<String> = data["children"]
        .as_array()
        .map(|kids| {
            kids.iter()
                .map(|child| block_to_md(child, &format!("{indent}  ")))
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if children.is_empty() {
        line
    } else {
        format!("{line}\n{}", children.join("\n"))
    }
}

/// Notion blocks to Markdown, one blank line between blocks.
pub fn blocks_to_markdown(blocks: &[Value]) -> String {
    let joined = blocks
        .iter()
        .map(|b| block_to_md(b, ""))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut out = String::with_capacity(joined.len());
    let mut newlines = 0;
    for c in joined.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_page_id_variants() {
        let hex = "0123456789abcdef0123456789abcdef";
        assert_eq!(extract_page_id(hex).as_deref(), Some(hex));
        assert_eq!(
            extract_page_id("01234567-89ab-cdef-0123-456789abcdef").as_deref(),
            Some(hex)
        );
        assert_eq!(
            extract_page_id(&format!("https://www.notion.so/team/My-Page-{hex}")).as_deref(),
            Some(hex)
        );
        assert_eq!(
            extract_page_id(&format!("https://acme.notion.site/{hex}?pvs=4")).as_deref(),
            Some(hex)
        );
        assert_eq!(extract_page_id("https://example.com/page"), None);
        assert_eq!(extract_page_id("not-an-id"), None);
    }

    #[test]
    fn markdown_to_blocks_covers_common_syntax() {
        let md = "# Title\n\nIntro line\n- one\n* two\n3. three\n> quoted\n---\n```rust\nfn main() {}\n```\n### Small";
        let blocks = markdown_to_blocks(md);
        let kinds: Vec<&str> = blocks.iter().map(|b| b["type"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                "heading_1",
                "paragraph",
                "bulleted_list_item",
                "bulleted_list_item",
                "numbered_list_item",
                "quote",
                "divider",
                "code",
                "heading_3"
            ]
        );
        assert_eq!(
            blocks[4]["numbered_list_item"]["rich_text"][0]["text"]["content"],
            "three"
        );
        assert_eq!(blocks[7]["code"]["language"], "rust");
        assert_eq!(
            blocks[7]["code"]["rich_text"][0]["text"]["content"],
            "fn main() {}"
        );
    }

    #[test]
    fn long_paragraphs_are_split_into_chunks() {
        let long = "x".repeat(4500);
        let blocks = markdown_to_blocks(&long);
        let items = blocks[0]["paragraph"]["rich_text"].as_array().unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn blocks_to_markdown_renders_annotations() {
        let blocks = vec![
            json!({"type": "heading_2", "heading_2": {"rich_text": [{"plain_text": "Plan"}]}}),
            json!({"type": "paragraph", "paragraph": {"rich_text": [
                {"plain_text": "bold", "annotations": {"bold": true}},
                {"plain_text": " and "},
                {"plain_text": "link", "href": "https://x.dev"}
            ]}}),
            json!({"type": "to_do", "to_do": {"checked": true, "rich_text": [{"plain_text": "done"}]}}),
            json!({"type": "divider", "divider": {}}),
            json!({"type": "bookmark", "bookmark": {"url": "https://a.b"}}),
        ];
        let md = blocks_to_markdown(&blocks);
        assert_eq!(
            md,
            "## Plan\n\n**bold** and [link](https://x.dev)\n\n- [x] done\n\n---\n\n[https://a.b](https://a.b)"
        );
    }

    #[test]
    fn children_are_indented() {
        let blocks = vec![json!({
            "type": "bulleted_list_item",
            "bulleted_list_item": {
                "rich_text": [{"plain_text": "parent"}],
                "children": [
                    {"type": "bulleted_list_item", "bulleted_list_item": {"rich_text": [{"plain_text": "child"}]}}
                ]
            }
        })];
        assert_eq!(blocks_to_markdown(&blocks), "- parent\n  - child");
    }

    #[test]
    fn empty_paragraphs_collapse() {
        let blocks = vec![
            json!({"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "a"}]}}),
            json!({"type": "paragraph", "paragraph": {"rich_text": []}}),
            json!({"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "b"}]}}),
        ];
        assert_eq!(blocks_to_markdown(&blocks), "a\n\nb");
    }
}
