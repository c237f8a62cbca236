pub(crate) mod tokenizer;
pub(crate) mod tokens;
