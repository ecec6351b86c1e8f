mod draggable_tests;
