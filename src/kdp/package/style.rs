//! KDP样式表模块
//!
//! 为规范化时添加的class生成样式。页边距参照KDP的排版要求。

/// 样式表在OPF目录中的路径
pub const STYLESHEET_HREF: &str = "styles/kdp.css";

/// 生成指定class前缀的样式表
pub fn kdp_stylesheet(prefix: &str) -> String {
    let mut css = String::from(
        "@page {\n  margin-top: 1in;\n  margin-bottom: 1in;\n  margin-left: 0.75in;\n  margin-right: 0.75in;\n}\n\n",
    );

    let sizes = ["2em", "1.6em", "1.35em", "1.2em", "1.1em", "1em"];
    for (level, size) in sizes.iter().enumerate() {
        css.push_str(&format!(
            ".{prefix}-h{} {{\n  font-size: {size};\n  font-weight: bold;\n  margin: 1.2em 0 0.6em;\n  page-break-after: avoid;\n}}\n\n",
            level + 1
        ));
    }

    css.push_str(&format!(
        ".{prefix}-paragraph {{\n  margin: 0;\n  text-indent: 1.5em;\n  text-align: justify;\n}}\n\n.{prefix}-list {{\n  margin: 0.6em 0 0.6em 1.5em;\n}}\n\n.{prefix}-chapter {{\n  page-break-before: always;\n}}\n"
    ));
    css
}
