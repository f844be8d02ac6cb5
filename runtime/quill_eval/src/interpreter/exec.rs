//! The statement layer: a small command set over the evaluator.
//!
//! Lines are first grouped into a block tree (`if`/`while`/`for` bodies and
//! `function` definitions), then run. One command per line; a line whose
//! first non-blank character is `\` continues the previous one, and `"`
//! starts a comment.
//!
//! At the top level and in `abort` functions the first error stops
//! execution. Elsewhere the error is reported and execution continues with
//! the next statement; a failing `if` or `while` condition skips its block.

use std::rc::Rc;

use quill_value::errors::{
    block_without_start, list_required, missing_block_end, missing_in_after_for, not_a_command,
    trailing_characters,
};
use quill_value::{EvalError, EvalResult, Value};

use super::Interpreter;
use crate::parse::Cursor;

/// How a statement finished.
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

#[derive(Clone, Copy, Debug)]
struct ExecContext {
    abort_on_error: bool,
    in_function: bool,
    loop_depth: usize,
}

/// Commands and their shortest accepted abbreviations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Call,
    Let,
    Unlet,
    LockVar,
    UnlockVar,
    If,
    ElseIf,
    Else,
    EndIf,
    While,
    EndWhile,
    For,
    EndFor,
    Break,
    Continue,
    Return,
    Function,
    EndFunction,
    DelFunction,
}

const COMMANDS: &[(&str, usize, Command)] = &[
    ("call", 3, Command::Call),
    ("let", 3, Command::Let),
    ("unlet", 3, Command::Unlet),
    ("unlockvar", 4, Command::UnlockVar),
    ("lockvar", 5, Command::LockVar),
    ("if", 2, Command::If),
    ("elseif", 5, Command::ElseIf),
    ("else", 2, Command::Else),
    ("endfunction", 4, Command::EndFunction),
    ("endfor", 5, Command::EndFor),
    ("endwhile", 4, Command::EndWhile),
    ("endif", 2, Command::EndIf),
    ("while", 2, Command::While),
    ("for", 3, Command::For),
    ("break", 4, Command::Break),
    ("continue", 3, Command::Continue),
    ("return", 4, Command::Return),
    ("function", 2, Command::Function),
    ("delfunction", 4, Command::DelFunction),
];

impl Command {
    fn lookup(word: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(name, min, _)| word.len() >= *min && name.starts_with(word))
            .map(|&(_, _, command)| command)
    }

    fn name(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(_, _, command)| *command == self)
            .map_or("", |(name, _, _)| name)
    }
}

/// One logical line split into its command, bang and arguments.
#[derive(Debug)]
struct Line {
    number: usize,
    text: String,
    command: Option<Command>,
    force: bool,
    args_at: usize,
}

impl Line {
    fn args(&self) -> &str {
        &self.text[self.args_at..]
    }
}

#[derive(Debug)]
enum Stmt {
    Simple(Line),
    If {
        branches: Vec<(Line, Vec<Stmt>)>,
        otherwise: Option<Vec<Stmt>>,
    },
    While {
        head: Line,
        body: Vec<Stmt>,
    },
    For {
        head: Line,
        body: Vec<Stmt>,
    },
    Function {
        head: Line,
        body: Rc<[String]>,
    },
}

impl Interpreter {
    /// Run lines at the top level; the first error stops execution.
    pub(crate) fn execute_lines(&mut self, lines: &[String]) -> Result<(), EvalError> {
        let block = parse_block_tree(lines)?;
        let ctx = ExecContext {
            abort_on_error: true,
            in_function: false,
            loop_depth: 0,
        };
        self.run_block(&block, ctx).map(drop)
    }

    /// Run a function body, yielding its `return` value or 0.
    pub(crate) fn run_function_lines(&mut self, lines: &[String], abort: bool) -> EvalResult {
        let block = parse_block_tree(lines)?;
        let ctx = ExecContext {
            abort_on_error: abort,
            in_function: true,
            loop_depth: 0,
        };
        match self.run_block(&block, ctx)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::number(0)),
        }
    }

    fn run_block(&mut self, block: &[Stmt], ctx: ExecContext) -> Result<Flow, EvalError> {
        for stmt in block {
            self.check_abort()?;
            match self.run_stmt(stmt, ctx) {
                Ok(Flow::Normal) => {}
                Ok(flow) => return Ok(flow),
                Err(err) => self.recover(err, ctx)?,
            }
        }
        Ok(Flow::Normal)
    }

    /// Propagate `err` where execution stops on errors, report it otherwise.
    fn recover(&mut self, err: EvalError, ctx: ExecContext) -> Result<(), EvalError> {
        if ctx.abort_on_error || err.is_interrupt() || self.is_aborting() {
            return Err(err);
        }
        self.report_error(err);
        Ok(())
    }

    fn run_stmt(&mut self, stmt: &Stmt, ctx: ExecContext) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Simple(line) => self.run_simple(line, ctx),
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (head, body) in branches {
                    match self.eval_condition(head.args()) {
                        Ok(true) => return self.run_block(body, ctx),
                        Ok(false) => {}
                        Err(err) => {
                            self.recover(err, ctx)?;
                            return Ok(Flow::Normal);
                        }
                    }
                }
                match otherwise {
                    Some(body) => self.run_block(body, ctx),
                    None => Ok(Flow::Normal),
                }
            }
            Stmt::While { head, body } => {
                let inner = ExecContext {
                    loop_depth: ctx.loop_depth + 1,
                    ..ctx
                };
                loop {
                    self.check_abort()?;
                    match self.eval_condition(head.args()) {
                        Ok(true) => {}
                        Ok(false) => return Ok(Flow::Normal),
                        Err(err) => {
                            self.recover(err, ctx)?;
                            return Ok(Flow::Normal);
                        }
                    }
                    match self.run_block(body, inner)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::For { head, body } => self.run_for(head, body, ctx),
            Stmt::Function { head, body } => {
                self.define_command(head.args(), head.force, body.clone())?;
                Ok(Flow::Normal)
            }
        }
    }

    fn run_simple(&mut self, line: &Line, ctx: ExecContext) -> Result<Flow, EvalError> {
        tracing::trace!(line = line.number, text = %line.text, "statement");
        let Some(command) = line.command else {
            return Err(not_a_command(&line.text));
        };
        let args = line.args();
        match command {
            Command::Let => self.let_command(args)?,
            Command::Unlet => self.unlet_command(args, line.force)?,
            Command::LockVar => self.lock_command(args, line.force, true)?,
            Command::UnlockVar => self.lock_command(args, line.force, false)?,
            Command::Call => {
                self.eval_statement_expr(args)?;
            }
            Command::DelFunction => self.delfunction_command(args, line.force)?,
            Command::Break | Command::Continue if ctx.loop_depth == 0 => {
                return Err(block_without_start(command.name()));
            }
            Command::Break => return Ok(Flow::Break),
            Command::Continue => return Ok(Flow::Continue),
            Command::Return => {
                if !ctx.in_function {
                    return Err(block_without_start(command.name()));
                }
                let mut cur = Cursor::new(args);
                cur.skip_white();
                let value = if cur.at_end() || cur.peek() == Some(b'"') {
                    Value::number(0)
                } else {
                    self.eval_statement_expr(args)?
                };
                return Ok(Flow::Return(value));
            }
            // Block commands never reach here; the tree builder consumed them.
            Command::If
            | Command::ElseIf
            | Command::Else
            | Command::EndIf
            | Command::While
            | Command::EndWhile
            | Command::For
            | Command::EndFor
            | Command::Function
            | Command::EndFunction => return Err(block_without_start(command.name())),
        }
        Ok(Flow::Normal)
    }

    /// `for {target} in {list}`: items are taken by index from the live list,
    /// so changes made by the body are seen by later iterations.
    fn run_for(&mut self, head: &Line, body: &[Stmt], ctx: ExecContext) -> Result<Flow, EvalError> {
        let args = head.args();
        let (target, expr) = match self.split_for_header(args) {
            Ok(parts) => parts,
            Err(err) => {
                self.recover(err, ctx)?;
                return Ok(Flow::Normal);
            }
        };
        let list = match self.eval_statement_expr(expr) {
            Ok(Value::List(list)) => list,
            Ok(_) => {
                self.recover(list_required(), ctx)?;
                return Ok(Flow::Normal);
            }
            Err(err) => {
                self.recover(err, ctx)?;
                return Ok(Flow::Normal);
            }
        };
        let inner = ExecContext {
            loop_depth: ctx.loop_depth + 1,
            ..ctx
        };
        let mut index = 0;
        while let Some(item) = list.get(index) {
            self.check_abort()?;
            let assigned = if target.starts_with('[') {
                self.assign_pattern(target, &item)
            } else {
                self.assign_text(target, item)
            };
            if let Err(err) = assigned {
                self.recover(err, ctx)?;
                break;
            }
            match self.run_block(body, inner)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            index += 1;
        }
        Ok(Flow::Normal)
    }

    /// Split `target in expr`.
    fn split_for_header<'a>(&mut self, args: &'a str) -> Result<(&'a str, &'a str), EvalError> {
        let mut cur = Cursor::new(args);
        cur.skip_white();
        let start = cur.pos();
        if cur.peek() == Some(b'[') {
            let Some(close) = cur.rest().find(']') else {
                return Err(missing_in_after_for(args));
            };
            cur.bump(close + 1);
        } else {
            self.parse_lvalue(&mut cur, false)?;
        }
        let target = cur.since(start);
        cur.skip_white();
        if !cur.eat_str("in") || !cur.peek().is_some_and(|b| b == b' ' || b == b'\t') {
            return Err(missing_in_after_for(args));
        }
        Ok((target, cur.rest()))
    }

    fn eval_condition(&mut self, text: &str) -> Result<bool, EvalError> {
        self.eval_statement_expr(text)?.is_truthy()
    }

    /// One complete expression, optionally followed by a `"` comment.
    fn eval_statement_expr(&mut self, text: &str) -> EvalResult {
        let mut cur = Cursor::new(text);
        cur.skip_white();
        let value = self.eval_expression(&mut cur, true)?;
        cur.skip_white();
        if !cur.at_end() && cur.peek() != Some(b'"') {
            return Err(trailing_characters(cur.rest()));
        }
        Ok(value)
    }
}

/// Join continuation lines and drop blank and comment lines.
fn logical_lines(lines: &[String]) -> Vec<(usize, String)> {
    let mut logical: Vec<(usize, String)> = Vec::new();
    for (number, raw) in lines.iter().enumerate() {
        let trimmed = raw.trim_start();
        if let Some(continued) = trimmed.strip_prefix('\\') {
            if let Some((_, previous)) = logical.last_mut() {
                previous.push_str(continued);
                continue;
            }
        }
        logical.push((number + 1, trimmed.to_string()));
    }
    logical.retain(|(_, text)| {
        let text = text.trim_start_matches([' ', '\t', ':']);
        !text.is_empty() && !text.starts_with('"')
    });
    logical
}

/// Split a logical line into command word, bang and arguments.
fn split_command(number: usize, text: String) -> Line {
    let body_at = text.len() - text.trim_start_matches([' ', '\t', ':']).len();
    let word_len = text[body_at..]
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    let word = &text[body_at..body_at + word_len];
    let command = Command::lookup(word);
    let mut args_at = body_at + word_len;
    let force = text[args_at..].starts_with('!');
    if force {
        args_at += 1;
    }
    Line {
        number,
        text,
        command,
        force,
        args_at,
    }
}

fn parse_block_tree(lines: &[String]) -> Result<Vec<Stmt>, EvalError> {
    let mut lines = logical_lines(lines)
        .into_iter()
        .map(|(number, text)| split_command(number, text));
    let (block, end) = parse_block(&mut lines, &[])?;
    match end {
        Some(line) => Err(block_without_start(
            line.command.map_or("", Command::name),
        )),
        None => Ok(block),
    }
}

/// Parse statements until one of `terminators` (returned) or the end.
fn parse_block<I: Iterator<Item = Line>>(
    lines: &mut I,
    terminators: &[Command],
) -> Result<(Vec<Stmt>, Option<Line>), EvalError> {
    let mut block = Vec::new();
    while let Some(line) = lines.next() {
        let Some(command) = line.command else {
            block.push(Stmt::Simple(line));
            continue;
        };
        if terminators.contains(&command) {
            return Ok((block, Some(line)));
        }
        match command {
            Command::If => block.push(parse_if(lines, line)?),
            Command::While => {
                let (body, end) = parse_block(lines, &[Command::EndWhile])?;
                if end.is_none() {
                    return Err(missing_block_end("while"));
                }
                block.push(Stmt::While { head: line, body });
            }
            Command::For => {
                let (body, end) = parse_block(lines, &[Command::EndFor])?;
                if end.is_none() {
                    return Err(missing_block_end("for"));
                }
                block.push(Stmt::For { head: line, body });
            }
            Command::Function => {
                let body = collect_function_body(lines)?;
                block.push(Stmt::Function { head: line, body });
            }
            Command::ElseIf
            | Command::Else
            | Command::EndIf
            | Command::EndWhile
            | Command::EndFor
            | Command::EndFunction => return Err(block_without_start(command.name())),
            _ => block.push(Stmt::Simple(line)),
        }
    }
    Ok((block, None))
}

fn parse_if<I: Iterator<Item = Line>>(lines: &mut I, head: Line) -> Result<Stmt, EvalError> {
    let closers = [Command::ElseIf, Command::Else, Command::EndIf];
    let mut branches = Vec::new();
    let mut head = head;
    loop {
        let (body, end) = parse_block(lines, &closers)?;
        branches.push((head, body));
        let Some(end) = end else {
            return Err(missing_block_end("if"));
        };
        match end.command {
            Some(Command::ElseIf) => head = end,
            Some(Command::Else) => {
                let (otherwise, end) = parse_block(lines, &closers)?;
                return match end.and_then(|line| line.command) {
                    Some(Command::EndIf) => Ok(Stmt::If {
                        branches,
                        otherwise: Some(otherwise),
                    }),
                    Some(Command::ElseIf) => Err(block_without_start("elseif")),
                    Some(Command::Else) => Err(block_without_start("else")),
                    _ => Err(missing_block_end("if")),
                };
            }
            _ => {
                return Ok(Stmt::If {
                    branches,
                    otherwise: None,
                })
            }
        }
    }
}

/// Raw lines up to the matching `endfunction`; nested definitions are kept
/// whole for the body to define when it runs.
fn collect_function_body<I: Iterator<Item = Line>>(
    lines: &mut I,
) -> Result<Rc<[String]>, EvalError> {
    let mut body = Vec::new();
    let mut depth = 0usize;
    for line in lines.by_ref() {
        match line.command {
            Some(Command::Function) => depth += 1,
            Some(Command::EndFunction) if depth == 0 => return Ok(Rc::from(body)),
            Some(Command::EndFunction) => depth -= 1,
            _ => {}
        }
        body.push(line.text);
    }
    Err(missing_block_end("function"))
}
