use super::display::DisplayConfig;
use colored::Colorize;

pub fn generate_prompt(
    in_multiline: bool,
    collection: Option<&str>,
    query_count: usize,
    config: &DisplayConfig,
) -> String {
    if in_multiline {
        if config.use_colors {
            "    ... ".bright_black().to_string()
        } else {
            "    ... ".to_string()
        }
    } else {
        let base = match collection {
            Some(collection) => format!("lbquery({})", collection),
            None => "lbquery".to_string(),
        };

        if config.use_colors {
            format!(
                "{}{}> ",
                base.bright_cyan().bold(),
                format!("[{}]", query_count).bright_black()
            )
        } else {
            format!("{}[{}]> ", base, query_count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompt_names_collection() {
        let config = DisplayConfig {
            use_colors: false,
            ..DisplayConfig::default()
        };
        assert_eq!(generate_prompt(false, Some("person"), 2, &config), "lbquery(person)[2]> ");
        assert_eq!(generate_prompt(false, None, 0, &config), "lbquery[0]> ");
        assert_eq!(generate_prompt(true, None, 0, &config), "    ... ");
    }
}
