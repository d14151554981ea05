mod parsing_test;
mod preparing_test;
mod tokenizing_test;
