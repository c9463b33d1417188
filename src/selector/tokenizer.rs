use super::errors::SelectError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// 原子名：保留字、扩展名或 format_id
    Name(String),
    Plus,
    Comma,
    Slash,
    LParen,
    RParen,
    /// 方括号过滤器的内部文本，具体子句交给 filter 模块解析
    Filter(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 在表达式里的字节偏移，用于错误报告
    pub pos: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// 把选择表达式拆成 token 流；括号配对问题在这里就报错
pub fn tokenize(expr: &str) -> Result<Vec<Token>, SelectError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | ',' | '/' | '(' | ')' => {
                chars.next();
                let kind = match c {
                    '+' => TokenKind::Plus,
                    ',' => TokenKind::Comma,
                    '/' => TokenKind::Slash,
                    '(' => TokenKind::LParen,
                    _ => TokenKind::RParen,
                };
                tokens.push(Token { kind, pos });
            }
            '[' => {
                chars.next();
                let mut body = String::new();
                let mut closed = false;
                for (_, fc) in chars.by_ref() {
                    if fc == ']' {
                        closed = true;
                        break;
                    }
                    body.push(fc);
                }
                if !closed {
                    return Err(SelectError::syntax(expr, pos, "方括号未闭合"));
                }
                tokens.push(Token {
                    kind: TokenKind::Filter(body),
                    pos,
                });
            }
            ']' => {
                return Err(SelectError::syntax(expr, pos, "多余的 \"]\""));
            }
            c if is_name_char(c) => {
                let mut name = String::new();
                while let Some(&(_, nc)) = chars.peek() {
                    if is_name_char(nc) {
                        name.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Name(name),
                    pos,
                });
            }
            _ => {
                return Err(SelectError::syntax(expr, pos, format!("无法识别的字符 \"{}\"", c)));
            }
        }
    }

    Ok(tokens)
}
