mod helpers;

mod compaction_tests;
