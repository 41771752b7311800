mod options_test;
