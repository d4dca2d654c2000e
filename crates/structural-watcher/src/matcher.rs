use crate::config::WatcherConfig;
use crate::ports::HostElement;

/// Decides which elements are interactive controls worth instrumenting.
#[derive(Clone, Debug)]
pub struct ControlMatcher {
    keyword: String,
    case_sensitive: bool,
}

impl ControlMatcher {
    pub fn new(keyword: impl Into<String>, case_sensitive: bool) -> Self {
        let keyword = keyword.into();
        let keyword = if case_sensitive {
            keyword
        } else {
            keyword.to_lowercase()
        };
        Self {
            keyword,
            case_sensitive,
        }
    }

    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new(config.keyword.clone(), config.case_sensitive)
    }

    pub fn matches<E: HostElement>(&self, element: &E) -> bool {
        if !is_control(element) {
            return false;
        }
        let label = control_label(element);
        if self.case_sensitive {
            label.contains(&self.keyword)
        } else {
            label.to_lowercase().contains(&self.keyword)
        }
    }
}

/// `<button>` or `<input type=submit>`.
pub fn is_control<E: HostElement>(element: &E) -> bool {
    if !element.is_element() {
        return false;
    }
    match element.tag_name().as_str() {
        "button" => true,
        "input" => element
            .attribute("type")
            .map_or(false, |kind| kind.trim().eq_ignore_ascii_case("submit")),
        _ => false,
    }
}

/// The control's value when it has one, its text otherwise, trimmed.
pub fn control_label<E: HostElement>(element: &E) -> String {
    element
        .value()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| element.text_content())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryElement;

    #[test]
    fn buttons_and_submit_inputs_are_controls() {
        assert!(is_control(&MemoryElement::element("button")));
        assert!(is_control(
            &MemoryElement::element("input").with_attr("type", "SUBMIT")
        ));
        assert!(!is_control(
            &MemoryElement::element("input").with_attr("type", "text")
        ));
        assert!(!is_control(&MemoryElement::element("a")));
        assert!(!is_control(&MemoryElement::text("Post")));
    }

    #[test]
    fn value_takes_precedence_over_text() {
        let input = MemoryElement::element("input")
            .with_attr("type", "submit")
            .with_attr("value", "  Post  ");
        assert_eq!(control_label(&input), "Post");

        let button = MemoryElement::element("button")
            .with_attr("value", "")
            .with_child(MemoryElement::text(" Submit Post "));
        assert_eq!(control_label(&button), "Submit Post");
    }

    #[test]
    fn case_sensitivity_is_configurable() {
        let button = MemoryElement::element("button").with_child(MemoryElement::text("repost"));
        assert!(!ControlMatcher::new("Post", true).matches(&button));
        assert!(ControlMatcher::new("Post", false).matches(&button));
        assert!(ControlMatcher::new("post", true).matches(&button));
    }
}
