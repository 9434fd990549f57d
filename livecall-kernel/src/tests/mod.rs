mod lexer_tests;
mod parser_tests;
