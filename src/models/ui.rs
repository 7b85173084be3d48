//! 界面元素相关的基础类型

use std::fmt;

/// 元素在屏幕上的矩形区域（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// 矩形中心点，用于点击
    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }
}

/// 元素选择器
///
/// 所有已设置的字段都必须匹配
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selector {
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub class_name: Option<String>,
}

impl Selector {
    /// 按 resource-id 选择
    pub fn resource_id(id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// 按 content-desc 选择
    pub fn description(desc: impl Into<String>) -> Self {
        Self {
            description: Some(desc.into()),
            ..Default::default()
        }
    }

    /// 追加类名条件
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = &self.resource_id {
            parts.push(format!("resourceId={}", id));
        }
        if let Some(desc) = &self.description {
            parts.push(format!("description={}", desc));
        }
        if let Some(class_name) = &self.class_name {
            parts.push(format!("className={}", class_name));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// 屏幕方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 设备自然方向（旋转 0°）
    Natural,
    /// 向左旋转 90°
    Left,
    /// 旋转 180°
    UpsideDown,
    /// 向右旋转 90°
    Right,
}

impl Orientation {
    /// 对应 `settings put system user_rotation` 的取值
    pub fn user_rotation(self) -> u8 {
        match self {
            Orientation::Natural => 0,
            Orientation::Left => 1,
            Orientation::UpsideDown => 2,
            Orientation::Right => 3,
        }
    }
}
