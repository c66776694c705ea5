use super::*;
use crate::newsfeed::NewsfeedGenerator;

/// In-process newsfeed service
pub struct NewsfeedService {
    generator: NewsfeedGenerator,
}

impl NewsfeedService {
    pub fn new(generator: NewsfeedGenerator) -> Self {
        Self { generator }
    }
}

impl NewsfeedApi for NewsfeedService {
    fn generate_newsfeed(&self, req: UserRequest) -> ServiceResult<GenerateNewsfeedResponse> {
        Ok(self.generator.generate_newsfeed(req.user_id)?)
    }
}
