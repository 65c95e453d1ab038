use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

const INSTRUCTIONS: &str = include_str!("prompts/instructions.md");
const EQUATION_MESSAGE: &str = include_str!("prompts/equation.md");

#[derive(Serialize)]
struct EquationContext<'a> {
    equation: &'a str,
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// The fixed instruction prompt of the math tutor assistant
pub fn assistant_instructions() -> String {
    INSTRUCTIONS.trim_end().to_string()
}

/// Render the user message asking for help with `equation`
pub fn equation_message(equation: &str) -> Result<String, TeraError> {
    let rendered = load_prompt(EQUATION_MESSAGE, &EquationContext { equation })?;
    Ok(rendered.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_prompt() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        context.insert("age".to_string(), 30.to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Hello, Alice! You are 30 years old.");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        // 'age' is missing from context
        let result = load_prompt(template, &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_equation_message() {
        let message = equation_message("2x + 3 = 7").unwrap();
        assert_eq!(
            message,
            "저는 방정식을 풀어야해요 `2x + 3 = 7`. 도와줄 수 있나요?"
        );
    }

    #[test]
    fn test_equation_message_is_not_interpreted() {
        // Template syntax inside the equation is data, not template
        let message = equation_message("{{ x }} < 3 & y > 1").unwrap();
        assert!(message.contains("`{{ x }} < 3 & y > 1`"));
    }

    #[test]
    fn test_equation_message_empty() {
        let message = equation_message("").unwrap();
        assert!(message.contains("``"));
    }

    #[test]
    fn test_instructions_have_no_trailing_newline() {
        let instructions = assistant_instructions();
        assert!(instructions.starts_with("당신은 개인 수학 선생님입니다."));
        assert!(!instructions.ends_with('\n'));
    }
}
