use super::*;
use crate::ast::{EmptyBehavior, Requirement, SchemaDefinition, ValueKind};

/// Comma-separated schema modifiers, in any order:
/// `!` `?` `~` `e` `min=Expr` `max=Expr` `type` `type[sub]` `=Expr`.
pub(super) fn parse_schema_value(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    let mut def = SchemaDefinition::default();

    loop {
        match parser.peek() {
            Token::Bang => {
                parser.bump();
                def.requirement = Requirement::Required;
            }
            Token::Question => {
                parser.bump();
                def.requirement = Requirement::Optional;
            }
            Token::Tilde => {
                parser.bump();
                def.empty_behavior = EmptyBehavior::Ignore;
            }
            Token::Assign => {
                parser.bump();
                def.default = Some(parser.parse_expression()?);
                def.empty_behavior = EmptyBehavior::Default;
            }
            Token::Ident(word) if word == "e" => {
                parser.bump();
                def.empty_behavior = EmptyBehavior::Error;
            }
            Token::Ident(word) if (word == "min" || word == "max") && parser.peek_at(1) == &Token::Assign => {
                let is_min = word == "min";
                parser.bump();
                parser.bump(); // =
                let bound = parser.parse_expression()?;
                if is_min {
                    def.min = Some(bound);
                } else {
                    def.max = Some(bound);
                }
            }
            Token::Ident(_) => {
                let (mut type_name, _) = parser.expect_ident("Expected type name")?;
                // `array[int]`: the bracket must touch the name, otherwise it
                // opens the next section header.
                if parser.check(&Token::LBracket) && parser.is_adjacent(0) {
                    parser.bump();
                    let (sub, _) = parser.expect_ident("Expected element type")?;
                    parser.expect(Token::RBracket, "Expected ']' after element type")?;
                    type_name = format!("{}[{}]", type_name, sub);
                }
                def.type_name = Some(type_name);
            }
            _ => {
                return Err(parser.error(
                    "Expected a schema modifier",
                    Some("Use !, ?, ~, e, min=, max=, a type name or =default"),
                    220,
                ));
            }
        }

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    Ok(Value::new(ValueKind::Schema(Box::new(def)), span))
}
