pub mod deal_ranker;
