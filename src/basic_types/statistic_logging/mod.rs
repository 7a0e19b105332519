pub mod statistic_logger;
