mod provision_tests;
