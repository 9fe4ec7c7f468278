// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Application, ApplicationDetail, ApplicationStatus, Company, Interest, Internship, InternshipDetail,
    InternshipSkill, MatchScore, ScoringWeights, Skill, SkillLevel, User, UserProfile, UserSkill,
};
pub use requests::{
    AddInterestRequest, AddSkillRequest, ApplicationListQuery, CreateApplicationRequest, CreateInternshipRequest,
    InternshipListQuery, LimitQuery, LoginRequest, SignupRequest, UpdateApplicationRequest, UpdateInternshipRequest,
    UpdateProfileRequest,
};
pub use responses::{
    ApplicationListResponse, ApplicationStats, AuthResponse, CategoryRecommendationsResponse, ErrorResponse,
    FieldError, HealthResponse, InternshipListResponse, InternshipView, MatchScoreResponse, MessageResponse,
    Pagination, RecommendationsResponse, RecommendedInternship, SavedInternship, SimilarResponse, StatusBreakdown,
    TrendingResponse,
};
