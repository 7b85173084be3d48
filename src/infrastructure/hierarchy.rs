//! uiautomator 界面层级解析
//!
//! `uiautomator dump` 输出的是扁平的 `<node .../>` 序列，这里只提取
//! 选择器和锚点计算需要的属性，不还原树结构

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Bounds, Selector};

/// 界面节点
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiNode {
    pub resource_id: String,
    pub content_desc: String,
    pub class_name: String,
    pub text: String,
    pub package: String,
    pub bounds: Option<Bounds>,
}

impl UiNode {
    /// 是否满足选择器的全部条件
    pub fn matches(&self, selector: &Selector) -> bool {
        selector
            .resource_id
            .as_ref()
            .map_or(true, |id| *id == self.resource_id)
            && selector
                .description
                .as_ref()
                .map_or(true, |desc| *desc == self.content_desc)
            && selector
                .class_name
                .as_ref()
                .map_or(true, |class_name| *class_name == self.class_name)
    }
}

/// 一次 dump 的全部节点（文档顺序）
#[derive(Debug, Clone, Default)]
pub struct UiHierarchy {
    nodes: Vec<UiNode>,
}

impl UiHierarchy {
    pub fn parse(xml: &str) -> Self {
        let nodes = node_regex()
            .captures_iter(xml)
            .map(|caps| parse_node(&caps[1]))
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[UiNode] {
        &self.nodes
    }

    /// 第一个匹配且带有效 bounds 的节点
    pub fn find(&self, selector: &Selector) -> Option<&UiNode> {
        self.nodes
            .iter()
            .find(|node| node.bounds.is_some() && node.matches(selector))
    }

    /// 根节点所属包名，即前台应用
    pub fn root_package(&self) -> Option<&str> {
        self.nodes
            .iter()
            .map(|node| node.package.as_str())
            .find(|package| !package.is_empty())
    }
}

fn parse_node(attrs: &str) -> UiNode {
    let mut node = UiNode::default();
    for caps in attr_regex().captures_iter(attrs) {
        let value = unescape(&caps[2]);
        match &caps[1] {
            "resource-id" => node.resource_id = value,
            "content-desc" => node.content_desc = value,
            "class" => node.class_name = value,
            "text" => node.text = value,
            "package" => node.package = value,
            "bounds" => node.bounds = parse_bounds(&value),
            _ => {}
        }
    }
    node
}

/// 解析 `[l,t][r,b]` 格式
pub fn parse_bounds(raw: &str) -> Option<Bounds> {
    let caps = bounds_regex().captures(raw)?;
    let value = |i: usize| caps[i].parse::<i32>().ok();
    Some(Bounds::new(value(1)?, value(2)?, value(3)?, value(4)?))
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let numeric = numeric_entity_regex().replace_all(raw, |caps: &regex::Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<node\b([^>]*?)/?>").expect("valid node regex"))
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([\w:-]+)="([^"]*)""#).expect("valid attr regex"))
}

fn bounds_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").expect("valid bounds regex")
    })
}

fn numeric_entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(\d+);").expect("valid entity regex"))
}
