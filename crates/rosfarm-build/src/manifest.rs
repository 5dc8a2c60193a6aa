//! Package manifest tag extraction.
//!
//! The scanner only needs a handful of elements out of `package.xml` and
//! `stack.xml`: the package name and its declared dependencies. The
//! extraction works on the raw text, after stripping XML comments, and
//! ignores everything else in the manifest.

use rosfarm_core::error::{PipelineError, Result};

/// The fields a catkin `package.xml` contributes to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub build_depends: Vec<String>,
    pub test_depends: Vec<String>,
}

/// Parse a catkin `package.xml`.
pub fn parse_package(xml: &str) -> Result<PackageManifest> {
    let xml = strip_comments(xml);
    let name = element_text(&xml, "name")
        .into_iter()
        .next()
        .ok_or_else(|| {
            PipelineError::Classification("package.xml is missing a <name> element".to_string())
        })?;
    Ok(PackageManifest {
        name,
        build_depends: element_text(&xml, "build_depend"),
        test_depends: element_text(&xml, "test_depend"),
    })
}

/// Parse the stack-level dependency declarations of a rosbuild `stack.xml`.
pub fn parse_stack_depends(xml: &str) -> Vec<String> {
    let xml = strip_comments(xml);
    attribute_values(&xml, "depend", "stack")
}

fn strip_comments(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + 3..],
            // unterminated comment swallows the remainder
            None => rest = "",
        }
    }
    out.push_str(rest);
    out
}

/// Collect the trimmed text of every `<tag>...</tag>` element.
fn element_text(xml: &str, tag: &str) -> Vec<String> {
    let mut values = Vec::new();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(gt) = after.find('>') else { break };
        let head = &after[..gt];
        // reject longer tag names sharing the prefix, e.g. <name_space>
        if !(head.is_empty() || head.starts_with(char::is_whitespace)) {
            rest = &after[gt + 1..];
            continue;
        }
        if head.trim_end().ends_with('/') {
            rest = &after[gt + 1..];
            continue;
        }
        let body = &after[gt + 1..];
        let Some(end) = body.find(&close) else { break };
        let text = body[..end].trim();
        if !text.is_empty() {
            values.push(text.to_string());
        }
        rest = &body[end + close.len()..];
    }
    values
}

/// Collect the value of `attr` from every `<element .../>` occurrence.
fn attribute_values(xml: &str, element: &str, attr: &str) -> Vec<String> {
    let mut values = Vec::new();
    let open = format!("<{}", element);
    let needle = format!("{}=\"", attr);
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(gt) = after.find('>') else { break };
        let head = &after[..gt];
        if head.is_empty() || head.starts_with(char::is_whitespace) {
            if let Some(at) = head.find(&needle) {
                let value = &head[at + needle.len()..];
                if let Some(quote) = value.find('"') {
                    let value = value[..quote].trim();
                    if !value.is_empty() {
                        values.push(value.to_string());
                    }
                }
            }
        }
        rest = &after[gt + 1..];
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE_XML: &str = r#"<?xml version="1.0"?>
<package>
  <name>cob_relayboard</name>
  <version>0.5.1</version>
  <description>Relayboard driver</description>
  <build_depend>roscpp</build_depend>
  <build_depend>std_msgs</build_depend>
  <!-- <build_depend>disabled_dep</build_depend> -->
  <test_depend>rostest</test_depend>
</package>
"#;

    const STACK_XML: &str = r#"<stack>
  <description brief="cob_driver">Hardware drivers</description>
  <depend stack="ros_comm"/>
  <depend stack="common_msgs" />
  <!-- <depend stack="disabled_stack"/> -->
</stack>
"#;

    #[test]
    fn parses_name_and_dependency_tags() {
        let manifest = parse_package(PACKAGE_XML).unwrap();
        assert_eq!(manifest.name, "cob_relayboard");
        assert_eq!(manifest.build_depends, vec!["roscpp", "std_msgs"]);
        assert_eq!(manifest.test_depends, vec!["rostest"]);
    }

    #[test]
    fn commented_out_tags_are_ignored() {
        let manifest = parse_package(PACKAGE_XML).unwrap();
        assert!(!manifest.build_depends.contains(&"disabled_dep".to_string()));

        let depends = parse_stack_depends(STACK_XML);
        assert!(!depends.contains(&"disabled_stack".to_string()));
    }

    #[test]
    fn missing_name_is_a_classification_error() {
        let err = parse_package("<package><build_depend>x</build_depend></package>").unwrap_err();
        assert!(matches!(
            err,
            rosfarm_core::PipelineError::Classification(_)
        ));
    }

    #[test]
    fn stack_depends_read_the_stack_attribute() {
        let depends = parse_stack_depends(STACK_XML);
        assert_eq!(depends, vec!["ros_comm", "common_msgs"]);
    }

    #[test]
    fn longer_tag_names_sharing_a_prefix_do_not_match() {
        let values = element_text("<name_space>x</name_space><name>y</name>", "name");
        assert_eq!(values, vec!["y"]);
    }

    #[test]
    fn self_closing_elements_contribute_no_text() {
        let values = element_text("<name/><name>real</name>", "name");
        assert_eq!(values, vec!["real"]);
    }

    #[test]
    fn unterminated_comment_swallows_the_remainder() {
        let depends = parse_stack_depends("<stack><!-- <depend stack=\"a\"/>");
        assert!(depends.is_empty());
    }
}
