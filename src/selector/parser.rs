use super::errors::SelectError;
use super::filter::{FilterClause, parse_filter_body};
use super::models::{Selector, SelectorKind};
use super::tokenizer::{Token, TokenKind, tokenize};

/// 把选择表达式解析成 AST；所有语法问题在这里暴露，求值阶段不再报语法错误
pub fn parse(expr: &str) -> Result<Selector, SelectError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        expr,
        tokens,
        idx: 0,
    };
    let mut items = parser.parse_group()?;
    if let Some(token) = parser.peek() {
        let message = match &token.kind {
            TokenKind::RParen => "多余的 \")\"",
            _ => "表达式存在无法解析的剩余部分",
        };
        let pos = token.pos;
        return Err(SelectError::syntax(expr, pos, message));
    }
    Ok(if items.len() == 1 {
        items.pop().unwrap()
    } else {
        Selector::Group(items)
    })
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    idx: usize,
}

// 逗号分组只允许出现在顶层，不能作为 "+" / "/" 的操作数
fn is_comma_group(selector: &Selector) -> bool {
    match selector {
        Selector::Group(_) => true,
        Selector::Filtered { inner, .. } => is_comma_group(inner),
        _ => false,
    }
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.idx).cloned();
        if token.is_some() {
            self.idx += 1;
        }
        token
    }

    /// 当前位置，用于错误报告；流结束时指向表达式末尾
    fn pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.expr.len())
    }

    /// Group := Alt (',' Alt)*
    fn parse_group(&mut self) -> Result<Vec<Selector>, SelectError> {
        let mut items = vec![self.parse_alt()?];
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Comma)) {
            self.bump();
            items.push(self.parse_alt()?);
        }
        Ok(items)
    }

    /// Alt := Merge ('/' Merge)*
    fn parse_alt(&mut self) -> Result<Selector, SelectError> {
        let mut options = vec![self.parse_merge()?];
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Slash)) {
            let pos = self.pos();
            self.bump();
            let option = self.parse_merge()?;
            if is_comma_group(options.last().unwrap()) || is_comma_group(&option) {
                return Err(SelectError::syntax(
                    self.expr,
                    pos,
                    "逗号分组不能作为 \"/\" 的备选项",
                ));
            }
            options.push(option);
        }
        Ok(if options.len() == 1 {
            options.pop().unwrap()
        } else {
            Selector::PickFirst(options)
        })
    }

    /// Merge := Atom ('+' Atom)*，左结合
    fn parse_merge(&mut self) -> Result<Selector, SelectError> {
        let mut left = self.parse_atom()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Plus)) {
            let pos = self.pos();
            self.bump();
            let right = self.parse_atom()?;
            if is_comma_group(&left) || is_comma_group(&right) {
                return Err(SelectError::syntax(
                    self.expr,
                    pos,
                    "逗号分组不能参与 \"+\" 合并",
                ));
            }
            left = Selector::Merge(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Atom := Base Filter*；裸过滤器挂在隐式 best 上
    fn parse_atom(&mut self) -> Result<Selector, SelectError> {
        let pos = self.pos();
        let mut base = match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Name(name)) => {
                self.bump();
                Selector::Single {
                    kind: SelectorKind::from_atom(&name),
                    filters: Vec::new(),
                }
            }
            Some(TokenKind::LParen) => {
                self.bump();
                let mut items = self.parse_group()?;
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::RParen)) {
                    self.bump();
                } else {
                    return Err(SelectError::syntax(self.expr, pos, "括号未闭合"));
                }
                if items.len() == 1 {
                    items.pop().unwrap()
                } else {
                    Selector::Group(items)
                }
            }
            Some(TokenKind::Filter(_)) => Selector::Single {
                kind: SelectorKind::Best,
                filters: Vec::new(),
            },
            _ => {
                return Err(SelectError::syntax(self.expr, pos, "此处缺少格式选择器"));
            }
        };

        while let Some(TokenKind::Filter(body)) = self.peek().map(|t| t.kind.clone()) {
            let filter_pos = self.pos();
            self.bump();
            let clauses = parse_filter_body(&body, self.expr, filter_pos)?;
            base = attach_filters(base, clauses);
        }
        Ok(base)
    }
}

fn attach_filters(selector: Selector, clauses: Vec<FilterClause>) -> Selector {
    match selector {
        Selector::Single { kind, mut filters } => {
            filters.extend(clauses);
            Selector::Single { kind, filters }
        }
        Selector::Filtered { inner, mut filters } => {
            filters.extend(clauses);
            Selector::Filtered { inner, filters }
        }
        other => Selector::Filtered {
            inner: Box::new(other),
            filters: clauses,
        },
    }
}
